//! PDF fixtures built in-process with lopdf's writer.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Content of one generated page.
pub enum PageFixture<'a> {
    /// Runs shown with consecutive `Tj` after `Td 72 720`, 10pt Courier
    Runs(&'a [&'a str]),
    /// A page dictionary with no `/Contents`
    Blank,
    /// A `/Contents` entry that is neither a stream nor an array
    Corrupt,
}

/// Build a PDF whose pages follow `pages`, on a Letter MediaBox.
pub fn build_pdf(pages: &[PageFixture<'_>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|spec| add_page(&mut doc, pages_id, resources_id, spec).into())
        .collect();
    let count = kids.len() as i64;

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("write pdf");
    buf
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    spec: &PageFixture<'_>,
) -> ObjectId {
    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => resources_id,
    };

    match spec {
        PageFixture::Runs(runs) => {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
            ];
            for run in runs.iter() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*run)]));
            }
            operations.push(Operation::new("ET", vec![]));

            let content = Content { operations };
            let stream = Stream::new(dictionary! {}, content.encode().expect("encode content"));
            page.set("Contents", doc.add_object(stream));
        }
        PageFixture::Blank => {}
        PageFixture::Corrupt => {
            page.set("Contents", 42);
        }
    }

    doc.add_object(page)
}

/// Approximate float comparison for rectangle components.
pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}
