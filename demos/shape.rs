//! A small `hb-shape`-style CLI: loads a font, shapes a line of text against
//! it and prints the resulting glyph ids, advances and offsets. Exists to
//! exercise the public API end to end, the way a font developer would poke
//! at a shaping engine from a terminal.

use std::process::ExitCode;
use std::str::FromStr;

use glyphforge::{Direction, Face, Feature, Language, Script, Tag, UnicodeBuffer, Variation};

const HELP: &str = "\
shape --font FILE --text TEXT [OPTIONS]

Options:
    --font FILE          path to a font file
    --text TEXT          text to shape
    --direction DIR       ltr | rtl | ttb | btt (default: guessed from script)
    --script TAG          four-letter ISO 15924 script tag (e.g. Arab)
    --language TAG        BCP 47 language tag (e.g. en)
    --features LIST       comma-separated feature tags, each optionally
                          suffixed with `=value` (e.g. liga=0,kern)
    --variations LIST     comma-separated `tag=value` pairs (e.g. wght=700)
    --face-index N        face index into a font collection (default: 0)
    -h, --help            print this message
";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let font_path: String = args.value_from_str("--font").map_err(|e| e.to_string())?;
    let text: String = args.value_from_str("--text").map_err(|e| e.to_string())?;
    let face_index: u32 = args.opt_value_from_str("--face-index").map_err(|e| e.to_string())?.unwrap_or(0);
    let direction: Option<String> = args.opt_value_from_str("--direction").map_err(|e| e.to_string())?;
    let script: Option<String> = args.opt_value_from_str("--script").map_err(|e| e.to_string())?;
    let language: Option<String> = args.opt_value_from_str("--language").map_err(|e| e.to_string())?;
    let features: Option<String> = args.opt_value_from_str("--features").map_err(|e| e.to_string())?;
    let variations: Option<String> = args.opt_value_from_str("--variations").map_err(|e| e.to_string())?;

    let remaining = args.finish();
    if !remaining.is_empty() {
        return Err(format!("unexpected arguments: {remaining:?}"));
    }

    let data = std::fs::read(&font_path).map_err(|e| format!("reading {font_path}: {e}"))?;
    let mut face = Face::from_slice(&data, face_index).map_err(|e| e.to_string())?;

    if let Some(variations) = variations.as_deref() {
        let parsed = parse_variations(variations)?;
        face.set_variations(&parsed);
    }

    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(&text);

    if let Some(direction) = direction.as_deref() {
        buffer.set_direction(parse_direction(direction)?);
    }
    if let Some(script) = script.as_deref() {
        buffer.set_script(parse_script(script)?);
    }
    if let Some(language) = language.as_deref() {
        let language = Language::from_str(language).ok_or_else(|| format!("bad language tag: {language}"))?;
        buffer.set_language(language);
    }

    let parsed_features = match features.as_deref() {
        Some(list) => parse_features(list)?,
        None => Vec::new(),
    };

    let output = glyphforge::shape(&face, buffer, &parsed_features);

    for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
        println!(
            "gid={:<5} cluster={:<4} adv=({:>5},{:>5}) off=({:>4},{:>4})",
            info.glyph_id, info.cluster, pos.x_advance, pos.y_advance, pos.x_offset, pos.y_offset
        );
    }

    Ok(())
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    match s {
        "ltr" => Ok(Direction::LeftToRight),
        "rtl" => Ok(Direction::RightToLeft),
        "ttb" => Ok(Direction::TopToBottom),
        "btt" => Ok(Direction::BottomToTop),
        other => Err(format!("bad direction: {other}")),
    }
}

fn parse_script(s: &str) -> Result<Script, String> {
    let bytes = s.as_bytes();
    if bytes.len() != 4 {
        return Err(format!("script tag must be 4 bytes: {s}"));
    }
    let mut tag = [0u8; 4];
    tag.copy_from_slice(bytes);
    Ok(Script::from_tag(Tag::from_bytes(&tag)))
}

fn parse_features(list: &str) -> Result<Vec<Feature>, String> {
    list.split(',')
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(2, '=');
            let tag_str = parts.next().unwrap_or("");
            let value: u32 = match parts.next() {
                Some(v) => v.parse().map_err(|_| format!("bad feature value: {entry}"))?,
                None => 1,
            };
            let tag = Tag::from_str(tag_str).map_err(|_| format!("bad feature tag: {entry}"))?;
            Ok(Feature::new(tag, value, ..))
        })
        .collect()
}

fn parse_variations(list: &str) -> Result<Vec<Variation>, String> {
    list.split(',')
        .filter(|s| !s.is_empty())
        .map(|entry| Variation::try_from(entry).map_err(|_| format!("bad variation: {entry}")))
        .collect()
}
