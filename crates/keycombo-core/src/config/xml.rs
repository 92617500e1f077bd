// Keycombo Config API - Keymap XML Format
// Reads and writes the userKeyCombos document

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::combo::{Combo, KeySpec};

const ROOT: &str = "userKeyCombos";
const COMBO: &str = "userKeyCombo";
const INPUT: &str = "in";
const DESCRIPTION: &str = "description";
const OUTPUTS: &str = "outArr";
const OUTPUT: &str = "out";
const MODIFIERS: &str = "mod";
const CODE: &str = "code";

/// Separator between modifier tokens inside `<mod>`
pub const MODIFIER_SEPARATOR: char = '|';

/// Written on first run: a valid, empty document holding commented examples
pub const KEYMAP_TEMPLATE: &str = r#"<!-- keycombo user key combos -->
<userKeyCombos>
    <!--
    <userKeyCombo>
        <in>
            <mod>KMOD_LCTRL|KMOD_LALT</mod>
            <code>SDL_SCANCODE_F1</code>
        </in>
        <description>Optional description</description>
        <outArr>
            <out>
                <mod>KMOD_LCTRL|KMOD_LSHIFT</mod>
                <code>SDL_SCANCODE_DELETE</code>
            </out>
        </outArr>
    </userKeyCombo>
    -->
    <!--
    <userKeyCombo>
        <in>
            <mod>KMOD_LCTRL|KMOD_LALT</mod>
            <code>SDL_SCANCODE_F2</code>
        </in>
        <description></description>
        <outArr>
            <out>
                <mod>KMOD_LCTRL|KMOD_LSHIFT</mod>
                <code>SDL_SCANCODE_DELETE</code>
            </out>
            <out>
                <mod>KMOD_LCTRL|KMOD_LSHIFT</mod>
                <code>SDL_SCANCODE_L</code>
            </out>
        </outArr>
    </userKeyCombo>
    -->
</userKeyCombos>
"#;

/// The document is not well-formed XML; nothing from it can be trusted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("XML parse error at line {line} (byte {position}): {message}")]
pub struct ParseError {
    pub line: usize,
    pub position: usize,
    pub message: String,
}

/// Combos read from a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCombos {
    pub combos: Vec<Combo>,
    /// `userKeyCombo` elements dropped because they had no `<in>` binding
    pub skipped: usize,
}

type XmlReader<'a> = Reader<&'a [u8]>;

fn parse_error(xml: &str, reader: &XmlReader<'_>, message: impl Into<String>) -> ParseError {
    let position = reader.buffer_position();
    let consumed = xml.get(..position).unwrap_or(xml);
    ParseError {
        line: consumed.matches('\n').count() + 1,
        position,
        message: message.into(),
    }
}

/// Progress through the single root element of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    Expected,
    Open { depth: usize },
    Closed,
}

fn is_blank(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

/// Walks the document and collects combos
struct ComboReader<'a> {
    xml: &'a str,
    reader: XmlReader<'a>,
}

impl<'a> ComboReader<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            xml,
            reader: Reader::from_str(xml),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        parse_error(self.xml, &self.reader, message)
    }

    /// Next event; EOF is reported as `None`
    fn next(&mut self) -> Result<Option<Event<'a>>, ParseError> {
        match self.reader.read_event() {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(e) => Err(self.error(e.to_string())),
        }
    }

    /// Next event inside `<within>`; EOF there breaks the document
    fn next_within(&mut self, within: &str) -> Result<Event<'a>, ParseError> {
        match self.next()? {
            Some(event) => Ok(event),
            None => Err(self.error(format!("unexpected end of document inside <{}>", within))),
        }
    }

    fn read_document(&mut self) -> Result<ParsedCombos, ParseError> {
        let mut parsed = ParsedCombos::default();
        let mut root = RootState::Expected;

        while let Some(event) = self.next()? {
            let in_root = matches!(root, RootState::Open { .. });
            match event {
                Event::Start(_) | Event::Empty(_) if root == RootState::Closed => {
                    return Err(self.error("extra content at end of document"));
                }
                Event::Text(ref t) if !is_blank(t) => {
                    let message = match root {
                        RootState::Expected => "start tag expected",
                        RootState::Open { .. } => continue,
                        RootState::Closed => "extra content at end of document",
                    };
                    return Err(self.error(message));
                }
                Event::Start(ref e) if in_root && e.name().as_ref() == COMBO.as_bytes() => {
                    match self.read_combo()? {
                        Some(combo) => parsed.combos.push(combo),
                        None => parsed.skipped += 1,
                    }
                }
                Event::Empty(ref e) if in_root && e.name().as_ref() == COMBO.as_bytes() => {
                    parsed.skipped += 1;
                }
                Event::Start(_) => {
                    root = match root {
                        RootState::Open { depth } => RootState::Open { depth: depth + 1 },
                        _ => RootState::Open { depth: 1 },
                    };
                }
                Event::Empty(_) if root == RootState::Expected => root = RootState::Closed,
                Event::End(_) => {
                    if let RootState::Open { depth } = root {
                        root = match depth {
                            1 => RootState::Closed,
                            _ => RootState::Open { depth: depth - 1 },
                        };
                    }
                }
                _ => {}
            }
        }

        match root {
            RootState::Closed => Ok(parsed),
            RootState::Expected => Err(self.error("premature end of document")),
            RootState::Open { depth } => Err(self.error(format!(
                "unexpected end of document, {} element(s) left open",
                depth
            ))),
        }
    }

    /// Read one `userKeyCombo`; `None` when it has no input binding
    fn read_combo(&mut self) -> Result<Option<Combo>, ParseError> {
        let mut input = None;
        let mut combo = Combo::default();

        loop {
            match self.next_within(COMBO)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"in" => input = Some(self.read_key_spec(INPUT)?),
                    b"description" => combo.description = self.read_text(DESCRIPTION)?,
                    b"outArr" => combo.outputs = self.read_outputs()?,
                    _ => self.skip_element(COMBO)?,
                },
                Event::Empty(ref e) => {
                    if e.name().as_ref() == INPUT.as_bytes() {
                        input = Some(KeySpec::default());
                    }
                }
                Event::End(_) => break,
                _ => {}
            }
        }

        Ok(input.map(|input| Combo { input, ..combo }))
    }

    fn read_outputs(&mut self) -> Result<Vec<KeySpec>, ParseError> {
        let mut outputs = Vec::new();
        loop {
            match self.next_within(OUTPUTS)? {
                Event::Start(ref e) => {
                    if e.name().as_ref() == OUTPUT.as_bytes() {
                        outputs.push(self.read_key_spec(OUTPUT)?);
                    } else {
                        self.skip_element(OUTPUTS)?;
                    }
                }
                Event::Empty(ref e) => {
                    if e.name().as_ref() == OUTPUT.as_bytes() {
                        outputs.push(KeySpec::default());
                    }
                }
                Event::End(_) => return Ok(outputs),
                _ => {}
            }
        }
    }

    fn read_key_spec(&mut self, within: &str) -> Result<KeySpec, ParseError> {
        let mut spec = KeySpec::default();
        loop {
            match self.next_within(within)? {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"mod" => spec.modifiers = split_modifiers(&self.read_text(MODIFIERS)?),
                    b"code" => spec.scancode = self.read_text(CODE)?.trim().to_string(),
                    _ => self.skip_element(within)?,
                },
                Event::End(_) => return Ok(spec),
                _ => {}
            }
        }
    }

    /// Text content of the element just opened, up to its end tag
    fn read_text(&mut self, within: &str) -> Result<String, ParseError> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.next_within(within)? {
                Event::Text(t) if depth == 0 => {
                    let unescaped = t.unescape().map_err(|e| self.error(e.to_string()))?;
                    text.push_str(&unescaped);
                }
                Event::CData(c) if depth == 0 => {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(text),
                Event::End(_) => depth -= 1,
                _ => {}
            }
        }
    }

    /// Consume an unknown element and everything inside it
    fn skip_element(&mut self, within: &str) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            match self.next_within(within)? {
                Event::Start(_) => depth += 1,
                Event::End(_) if depth == 0 => return Ok(()),
                Event::End(_) => depth -= 1,
                _ => {}
            }
        }
    }
}

fn split_modifiers(text: &str) -> Vec<String> {
    text.split(MODIFIER_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a keymap document.
///
/// Unknown elements are skipped and combos without an `<in>` binding are
/// counted in `skipped`. Any well-formedness problem, including a document
/// that ends with elements still open, fails the whole parse.
pub fn parse_combos(xml: &str) -> Result<ParsedCombos, ParseError> {
    ComboReader::new(xml).read_document()
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> quick_xml::Result<()> {
    if text.is_empty() {
        return writer.write_event(Event::Empty(BytesStart::new(name)));
    }
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn write_key_spec<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    spec: &KeySpec,
) -> quick_xml::Result<()> {
    let modifiers = spec.modifiers.join(&MODIFIER_SEPARATOR.to_string());
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    write_text_element(writer, MODIFIERS, &modifiers)?;
    write_text_element(writer, CODE, &spec.scancode)?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}

/// Serialize the complete combo list as a keymap document
pub fn write_combos(combos: &[Combo]) -> quick_xml::Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(ROOT)))?;

    for combo in combos {
        writer.write_event(Event::Start(BytesStart::new(COMBO)))?;
        write_key_spec(&mut writer, INPUT, &combo.input)?;
        if !combo.description.is_empty() {
            write_text_element(&mut writer, DESCRIPTION, &combo.description)?;
        }
        if combo.outputs.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new(OUTPUTS)))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new(OUTPUTS)))?;
            for output in &combo.outputs {
                write_key_spec(&mut writer, OUTPUT, output)?;
            }
            writer.write_event(Event::End(BytesEnd::new(OUTPUTS)))?;
        }
        writer.write_event(Event::End(BytesEnd::new(COMBO)))?;
    }

    writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

    let mut xml = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    xml.push('\n');
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(code: &str, mods: &[&str]) -> KeySpec {
        KeySpec::new(code, mods.iter().map(|m| m.to_string()).collect())
    }

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<userKeyCombos>
    <userKeyCombo>
        <in>
            <mod>KMOD_LCTRL|KMOD_LALT</mod>
            <code>SDL_SCANCODE_F1</code>
        </in>
        <description>Optional description</description>
        <outArr>
            <out>
                <mod>KMOD_LCTRL|KMOD_LSHIFT</mod>
                <code>SDL_SCANCODE_DELETE</code>
            </out>
        </outArr>
    </userKeyCombo>
</userKeyCombos>
"#;

    #[test]
    fn test_parse_sample_document() {
        let parsed = parse_combos(SAMPLE).unwrap();
        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.combos,
            vec![Combo::new(
                spec("SDL_SCANCODE_F1", &["KMOD_LCTRL", "KMOD_LALT"]),
                vec![spec("SDL_SCANCODE_DELETE", &["KMOD_LCTRL", "KMOD_LSHIFT"])],
                "Optional description",
            )]
        );
    }

    #[test]
    fn test_template_holds_no_combos() {
        let parsed = parse_combos(KEYMAP_TEMPLATE).unwrap();
        assert!(parsed.combos.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_round_trip() {
        let combos = vec![
            Combo::new(
                spec("SDL_SCANCODE_F2", &["KMOD_CTRL", "KMOD_ALT"]),
                vec![
                    spec("SDL_SCANCODE_DELETE", &["KMOD_LCTRL", "KMOD_LSHIFT"]),
                    spec("SDL_SCANCODE_L", &["KMOD_LCTRL", "KMOD_LSHIFT"]),
                ],
                "",
            ),
            Combo::new(spec("SDL_SCANCODE_ESCAPE", &[]), vec![], "block <escape> & co"),
        ];
        let xml = write_combos(&combos).unwrap();
        assert!(!xml.contains("<description></description>"));
        let parsed = parse_combos(&xml).unwrap();
        assert_eq!(parsed.combos, combos);
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_description_omitted_when_empty() {
        let combos = vec![Combo::new(spec("SDL_SCANCODE_A", &[]), vec![spec("SDL_SCANCODE_C", &[])], "")];
        let xml = write_combos(&combos).unwrap();
        assert!(!xml.contains("description"));
        assert!(xml.contains("<userKeyCombos>"));
    }

    #[test]
    fn test_combo_without_input_is_skipped() {
        let xml = r#"<userKeyCombos>
    <userKeyCombo>
        <description>no trigger</description>
        <outArr><out><mod/><code>SDL_SCANCODE_A</code></out></outArr>
    </userKeyCombo>
    <userKeyCombo/>
    <userKeyCombo>
        <in><mod>KMOD_LGUI</mod><code>SDL_SCANCODE_L</code></in>
        <outArr/>
    </userKeyCombo>
</userKeyCombos>"#;
        let parsed = parse_combos(xml).unwrap();
        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.combos.len(), 1);
        assert_eq!(parsed.combos[0].input, spec("SDL_SCANCODE_L", &["KMOD_LGUI"]));
        assert!(parsed.combos[0].outputs.is_empty());
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let xml = r#"<userKeyCombos>
    <version>2</version>
    <userKeyCombo>
        <in><mod> KMOD_LCTRL || KMOD_LALT </mod><code> SDL_SCANCODE_F1 </code><note>x</note></in>
        <color><rgb>red</rgb></color>
    </userKeyCombo>
</userKeyCombos>"#;
        let parsed = parse_combos(xml).unwrap();
        assert_eq!(parsed.combos.len(), 1);
        assert_eq!(parsed.combos[0].input, spec("SDL_SCANCODE_F1", &["KMOD_LCTRL", "KMOD_LALT"]));
    }

    #[test]
    fn test_truncated_document_fails() {
        let cut = &SAMPLE[..SAMPLE.find("</outArr>").unwrap()];
        let err = parse_combos(cut).unwrap_err();
        assert!(err.message.contains("unexpected end of document"), "{}", err);
        assert!(err.line > 1);
    }

    #[test]
    fn test_document_without_root_fails() {
        for xml in ["", "   \n", "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n", "<!-- only a comment -->"] {
            let err = parse_combos(xml).unwrap_err();
            assert!(err.message.contains("premature end of document"), "{:?}: {}", xml, err);
        }
        let err = parse_combos("not xml at all").unwrap_err();
        assert!(err.message.contains("start tag expected"), "{}", err);
        assert!(parse_combos(r#"{"combos": []}"#).is_err());
    }

    #[test]
    fn test_content_after_root_fails() {
        let err = parse_combos("<userKeyCombos/><userKeyCombos/>").unwrap_err();
        assert!(err.message.contains("extra content"), "{}", err);
        assert!(parse_combos("<userKeyCombos></userKeyCombos>\ntrailing").is_err());
        // Whitespace and comments after the root are fine
        assert!(parse_combos("<userKeyCombos></userKeyCombos>\n<!-- end -->\n").is_ok());
        assert_eq!(parse_combos("<userKeyCombos/>").unwrap(), ParsedCombos::default());
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let err = parse_combos("<userKeyCombos><userKeyCombo></userKeyCombos>");
        assert!(err.is_err());
    }
}
