//! Attachment budgets: direct allocator checks and end-to-end selection.

mod common;

use common::{attachment, engine, listings, options, remote};
use immosieve_budget::{allocate, Budget, Selection, Verdict};
use immosieve_core::attachment::{AttachmentGroup, Category};

fn titles(pairs: &[(&str, &str)]) -> Vec<String> {
    let records = listings();
    let out = engine().query(&records[..1], &options(pairs)).unwrap();
    out.hits[0]
        .attachments
        .iter()
        .map(|a| a.title.clone().unwrap_or_default())
        .collect()
}

#[test]
fn test_picture_cap_admits_first_two() {
    let pics = vec![
        attachment(AttachmentGroup::Bild, 400),
        attachment(AttachmentGroup::Bild, 400),
        attachment(AttachmentGroup::Bild, 400),
    ];
    let budget = Budget::new(Some(1000)).with_count_cap(Category::Picture, 2);
    let alloc = allocate(&pics, &Selection::All, &budget).unwrap();
    assert_eq!(alloc.shipped().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_byte_cap_holds_for_any_cap() {
    let list: Vec<_> = (0..40u64)
        .map(|i| {
            let group = match i % 5 {
                0 => AttachmentGroup::Titelbild,
                1 => AttachmentGroup::Grundriss,
                2 => AttachmentGroup::Dokumente,
                3 => AttachmentGroup::Film,
                _ => AttachmentGroup::Innenansichten,
            };
            attachment(group, (i * 37) % 250 + 1)
        })
        .collect();
    for cap in (0..3000).step_by(113) {
        let budget = Budget::new(Some(cap)).with_count_cap(Category::Picture, 5);
        let alloc = allocate(&list, &Selection::All, &budget).unwrap();
        let charged: u64 = alloc.pick(&list).iter().map(|a| a.size_bytes).sum();
        assert!(charged <= cap, "cap {} charged {}", cap, charged);
        let pictures = alloc
            .decisions
            .iter()
            .filter(|d| d.category == Category::Picture && d.verdict.ships())
            .count();
        assert!(pictures <= 5);
    }
}

#[test]
fn test_whitelisted_survive_zero_caps() {
    let list = vec![
        remote(AttachmentGroup::Links),
        attachment(AttachmentGroup::Bild, 1),
        remote(AttachmentGroup::Titelbild),
        attachment(AttachmentGroup::Dokumente, 1),
    ];
    let mut budget = Budget::new(Some(0));
    for category in Category::PRIORITY {
        budget = budget.with_count_cap(category, 0);
    }
    let alloc = allocate(&list, &Selection::All, &budget).unwrap();
    assert_eq!(alloc.shipped().collect::<Vec<_>>(), vec![0, 2]);
    assert_eq!(alloc.decisions[1].verdict, Verdict::CountCapReached);
}

#[test]
fn test_end_to_end_budget() {
    // two pictures fill 800 bytes, the floorplan fits, the document does not
    assert_eq!(
        titles(&[
            ("include", "attachments"),
            ("attachments", "pictures:2,bytes:1000"),
        ]),
        vec!["Außenansicht", "Küche", "Grundriss EG", "Rundgang"]
    );
}

#[test]
fn test_category_caps_without_byte_cap() {
    assert_eq!(
        titles(&[
            ("include", "attachments"),
            ("attachments", "pictures:1,floorplans:0,documents:1,other:0"),
        ]),
        vec!["Außenansicht", "Energieausweis", "Rundgang"]
    );
}

#[test]
fn test_selection_bypasses_budget() {
    assert_eq!(
        titles(&[
            ("include", "attachments"),
            ("attachments", "select:\"Küche\",bytes:1"),
        ]),
        vec!["Küche"]
    );
    assert_eq!(
        titles(&[("include", "attachments"), ("attachments", "select:0,select:3")]),
        vec!["Außenansicht", "Grundriss EG"]
    );
    assert_eq!(
        titles(&[("include", "attachments"), ("attachments", "select:%INNENANSICHTEN")]),
        vec!["Küche", "Bad"]
    );
}

#[test]
fn test_attachments_omitted_unless_included() {
    assert!(titles(&[("attachments", "pictures:2,bytes:1000")]).is_empty());
    assert_eq!(titles(&[("include", "attachments")]).len(), 6);
}

#[test]
fn test_attachment_option_errors() {
    let records = listings();
    for (attachments, code) in [
        ("scaling:640x480", 501),
        ("pictures:-2", 601),
        ("select:first", 602),
        ("select:1,select:\"Bad\"", 603),
        ("scaling:640", 301),
        ("scaling:640xabc", 302),
        ("scaling:640x480,scaling:320x240", 303),
    ] {
        let err = engine()
            .query(
                &records,
                &options(&[("include", "attachments"), ("attachments", attachments)]),
            )
            .unwrap_err();
        assert_eq!(err.code(), code, "attachments {:?}", attachments);
    }
}
