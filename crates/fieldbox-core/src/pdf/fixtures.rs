//! Small generated PDFs for tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

/// Font size used for every fixture string.
pub(crate) const FONT_SIZE: i64 = 10;

/// The font a fixture shows its strings in.
pub(crate) enum FixtureFont {
    /// One of the standard 14 fonts, with no `/Widths` array.
    Standard(&'static str),
    /// A non-standard simple font that declares its own `/Widths`.
    Widths {
        first_char: i64,
        widths: &'static [i64],
    },
}

impl FixtureFont {
    fn dictionary(&self, doc: &mut Document) -> Dictionary {
        match self {
            FixtureFont::Standard(name) => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => *name,
            },
            FixtureFont::Widths { first_char, widths } => {
                let descriptor_id = doc.add_object(dictionary! {
                    "Type" => "FontDescriptor",
                    "FontName" => "FixtureSans",
                    "Flags" => 32i64,
                    "FontBBox" => vec![
                        Object::Integer(0),
                        Object::Integer(-200),
                        Object::Integer(1000),
                        Object::Integer(800),
                    ],
                    "ItalicAngle" => 0i64,
                    "Ascent" => 800i64,
                    "Descent" => -200i64,
                    "CapHeight" => 700i64,
                    "StemV" => 80i64,
                });
                dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "FixtureSans",
                    "FirstChar" => *first_char,
                    "LastChar" => *first_char + widths.len() as i64 - 1,
                    "Widths" => widths.iter().map(|w| Object::Integer(*w)).collect::<Vec<_>>(),
                    "Encoding" => "WinAnsiEncoding",
                    "FontDescriptor" => descriptor_id,
                }
            }
        }
    }
}

/// Build a Courier PDF with one page per entry; each page lists
/// `(x, top, text)` strings positioned by the top-left corner of their glyph
/// boxes.
pub(crate) fn form_pdf(pages: &[&[(i64, i64, &str)]]) -> Vec<u8> {
    form_pdf_with_font(FixtureFont::Standard("Courier"), pages)
}

pub(crate) fn form_pdf_with_font(font: FixtureFont, pages: &[&[(i64, i64, &str)]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font = font.dictionary(&mut doc);
    let font_id = doc.add_object(font);

    let mut kids: Vec<Object> = Vec::new();
    for strings in pages {
        let mut operations = Vec::new();
        for (x, top, text) in strings.iter() {
            // Glyph boxes reach 0.8 of the font size above the baseline.
            let baseline = 792 - top - FONT_SIZE * 8 / 10;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
                Operation::new("Td", vec![(*x).into(), baseline.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        let content = Content { operations };
        let data = content.encode().expect("encode content");
        let content_id = doc.add_object(Stream::new(dictionary! {}, data));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            },
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save fixture");
    buffer
}
