//! Built-in rule sets
//!
//! Each preset is the single canonical rule list for one recurring edit.
//! Presets are looked up by name from configuration.

use crate::encoding::RepairTable;
use crate::error::RuleError;
use crate::rule::{ReplacementRule, RuleSet};

/// Names accepted by [`preset`]
pub const PRESET_NAMES: &[&str] = &[
    "encoding-repair",
    "palette-classes",
    "editorial-theme",
    "prompt-image-url",
    "image-search-query",
];

/// Font stylesheet that replaces the Inter link
pub const EDITORIAL_FONT_LINK: &str = concat!(
    r#"<link href="https://fonts.googleapis.com/css2?family=DM+Sans:ital,opsz,wght@0,9..40,400;"#,
    r#"0,9..40,500;0,9..40,600;0,9..40,700;1,9..40,400&family=Playfair+Display:ital,wght@0,400;"#,
    r#"0,600;0,700;0,900;1,400&display=swap" rel="stylesheet" />"#
);

const EDITORIAL_FONT_FAMILY: &str = r#"fontFamily: { sans: ['"DM Sans"', 'system-ui', 'sans-serif'], serif: ['"Playfair Display"', 'Georgia', 'serif'] }"#;

/// Look up a preset by name
///
/// # Errors
/// `RuleError::UnknownPreset` for names outside [`PRESET_NAMES`].
pub fn preset(name: &str) -> Result<RuleSet, RuleError> {
    match name {
        "encoding-repair" => Ok(RepairTable::canonical().to_rule_set()),
        "palette-classes" => palette_classes(),
        "editorial-theme" => editorial_theme(),
        "prompt-image-url" => prompt_image_url(),
        "image-search-query" => image_search_query(),
        other => Err(RuleError::UnknownPreset(other.to_string())),
    }
}

/// Concatenate several presets in the given order
///
/// # Errors
/// Fails on the first unknown name.
pub fn presets<S: AsRef<str>>(names: &[S]) -> Result<RuleSet, RuleError> {
    let mut set = RuleSet::new();
    for name in names {
        set.extend(preset(name.as_ref())?);
    }
    Ok(set)
}

/// Tailwind utility class, matched as a whole class token
fn class_rule(from: &str, to: &str) -> Result<ReplacementRule, RuleError> {
    let pattern = format!(r"\b{}\b", regex::escape(from));
    ReplacementRule::regex(format!("class {from}"), &pattern, to.replace('$', "$$"))
}

fn palette_classes() -> Result<RuleSet, RuleError> {
    Ok(RuleSet::new()
        // navy
        .with(ReplacementRule::literal("navy primary", "#0033A0", "#14213D")?)
        .with(class_rule("bg-blue-800", "bg-[#0b1324]")?)
        .with(class_rule("bg-blue-700", "bg-[#1f305c]")?)
        .with(class_rule("border-blue-700", "border-[#14213D]")?)
        .with(ReplacementRule::literal("navy dark", "#002280", "#0b1324")?)
        // red
        .with(ReplacementRule::literal("red highlight", "#EF3340", "#9A1B22")?)
        .with(class_rule("bg-red-50", "bg-[#F9F1F2]")?)
        .with(class_rule("border-red-200", "border-[#9A1B22]/20")?)
        .with(class_rule("bg-red-100", "bg-[#F1DEE0]")?)
        // gold
        .with(ReplacementRule::literal("gold", "#FFD100", "#DCA011")?))
}

fn editorial_theme() -> Result<RuleSet, RuleError> {
    Ok(RuleSet::new()
        .with(ReplacementRule::regex(
            "font link",
            r#"<link href="https://fonts\.googleapis\.com/css2\?family=Inter[^"]+" rel="stylesheet" />"#,
            EDITORIAL_FONT_LINK.replace('$', "$$"),
        )?)
        .with(ReplacementRule::literal("config gold", "'#FFD100'", "'#DCA011'")?)
        .with(ReplacementRule::literal("config navy", "'#0033A0'", "'#14213D'")?)
        .with(ReplacementRule::literal("config red", "'#EF3340'", "'#9A1B22'")?)
        .with(ReplacementRule::literal("config green", "'#006400'", "'#284B34'")?)
        .with(
            ReplacementRule::literal(
                "font family insert",
                "colors: {",
                format!("{EDITORIAL_FONT_FAMILY}, colors: {{"),
            )?
            .only_if_contains("tailwind.config")
            .skip_if_contains("fontFamily:"),
        )
        .with(ReplacementRule::literal(
            "font family swap",
            "fontFamily: { sans: ['Inter', 'system-ui', 'sans-serif'] }",
            EDITORIAL_FONT_FAMILY,
        )?)
        .with(class_rule("bg-slate-50", "bg-[#FDFBF7]")?)
        .with(ReplacementRule::literal(
            "serif heading dark",
            "font-black text-gray-900",
            "font-bold font-serif text-[#14213D]",
        )?)
        .with(ReplacementRule::literal(
            "serif heading light",
            "font-black text-white",
            "font-bold font-serif text-[#FDFBF7]",
        )?)
        .with(class_rule("rounded-3xl", "rounded-2xl")?))
}

fn prompt_image_url() -> Result<RuleSet, RuleError> {
    Ok(RuleSet::new()
        // one source line of the concatenation, including its trailing `+`
        .with(ReplacementRule::regex(
            "image_url line",
            r#"'[ \t]*"image_url"[ \t]*:[^\n]*?\\n'[ \t]*\+[ \t]*\r?\n[ \t]*"#,
            "",
        )?)
        .with(ReplacementRule::regex(
            "imageList definition",
            r"const imageList = \[[^\]]*\]\.join\('\\n'\);[ \t]*\r?\n?",
            "",
        )?)
        .with(ReplacementRule::literal(
            "image_url residue",
            "\"Elige URL MAS APROPIADA segun categoria del plato:\n\"\"\nNUNCA uses photo-XXXX. Elige URL completa de la lista.\",\n",
            "",
        )?)
        // line ending in `+` followed by a line starting with `+`, left by a removed operand
        .with(ReplacementRule::regex(
            "doubled plus",
            r"\+([ \t]*\r?\n[ \t]*)\+[ \t]*",
            "+$1",
        )?))
}

fn image_search_query() -> Result<RuleSet, RuleError> {
    Ok(RuleSet::new()
        .with(ReplacementRule::literal(
            "broaden query",
            "const query = encodeURIComponent(`${queryConcept} comida plato ecuador real photography -pinterest`);",
            "const query = encodeURIComponent(`${queryConcept} ecuador dish recipe`);",
        )?)
        .with(
            ReplacementRule::literal(
                "fetch timeout",
                "fetch(searchUrl)",
                "fetch(searchUrl, { signal: AbortSignal.timeout(10000) })",
            )?
            .skip_if_contains("AbortSignal"),
        ))
}
