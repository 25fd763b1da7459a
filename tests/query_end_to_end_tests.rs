//! End-to-end queries: JSON listings in, rendered hits and manifest out.

mod common;

use common::{engine, ids, listings, options, LISTINGS_JSON};
use immosieve_core::config::QueryConfig;
use immosieve_core::record::RealEstate;
use immosieve_exec::Engine;

#[test]
fn test_full_query() {
    let records = listings();
    let out = engine()
        .query(
            &records,
            &options(&[
                ("filter", "ort==Hannover and (mietbar==true or kaufpreis<400000)"),
                ("sort", "zimmer:desc"),
                ("paging", "limit:3,page:0"),
                ("include", "freitexte,attachments"),
                ("attachments", "pictures:1,bytes:600"),
                ("_", "1718000000000"),
            ]),
        )
        .unwrap();

    assert_eq!(ids(&out), vec!["K-001", "H-099", "H-101"]);
    assert_eq!(out.manifest.records_in, 5);
    assert_eq!(out.manifest.records_matched, 4);
    assert_eq!(out.manifest.records_out, 3);
    // H-101: one picture (400) and the floorplan (150) fit, plus the remote link
    assert_eq!(out.hits[2].attachments.len(), 3);
    assert_eq!(out.manifest.attachments_out, 3);
    assert!(out.manifest.finished_ms >= out.manifest.started_ms);
}

#[test]
fn test_rendered_hits_round_trip_json() {
    let records = listings();
    let e = engine();
    let plan = e
        .plan(&options(&[("filter", "zimmer>=4"), ("include", "freitexte")]))
        .unwrap();
    let out = e.run(&records, &plan).unwrap();
    let rendered: Vec<RealEstate> = out.hits.iter().map(|h| h.render(&plan)).collect();

    let json = serde_json::to_string(&rendered).unwrap();
    let back: Vec<RealEstate> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(
        back[0].freitexte.as_ref().and_then(|f| f.objekttitel.as_deref()),
        Some("Maisonette unterm Dach")
    );
    assert!(back.iter().all(|r| r.anhaenge.is_empty()));
}

#[test]
fn test_records_are_untouched() {
    let records = listings();
    let before: Vec<RealEstate> = serde_json::from_str(LISTINGS_JSON).unwrap();
    let _ = engine()
        .query(
            &records,
            &options(&[("sort", "kaltmiete:desc"), ("paging", "limit:1,page:0")]),
        )
        .unwrap();
    assert_eq!(records, before);
}

#[test]
fn test_config_limits_apply() {
    let records = listings();
    let strict = Engine::new(QueryConfig {
        max_filter_leaves: 2,
        max_page_size: Some(2),
        ..Default::default()
    });
    let err = strict
        .query(
            &records,
            &options(&[("filter", "zimmer>=1 or zimmer>=2 or zimmer>=3")]),
        )
        .unwrap_err();
    assert_eq!(err.code(), 105);

    let err = strict
        .query(&records, &options(&[("paging", "limit:3,page:0")]))
        .unwrap_err();
    assert_eq!(err.code(), 403);
}

#[test]
fn test_env_config_lookup() {
    let cfg = QueryConfig::from_lookup(|key| match key {
        "IMMOSIEVE_ATTACHMENT_BYTE_CAP" => Some("500".into()),
        _ => None,
    });
    let records = listings();
    let out = Engine::new(cfg)
        .query(&records[..1], &options(&[("include", "attachments")]))
        .unwrap();
    // default cap of 500: one 400-byte picture, then 90 bytes of document
    let titles: Vec<_> = out.hits[0]
        .attachments
        .iter()
        .filter_map(|a| a.title.as_deref())
        .collect();
    assert_eq!(titles, vec!["Außenansicht", "Energieausweis", "Rundgang"]);
}

#[test]
fn test_error_render_pairs() {
    let records = listings();
    let err = engine()
        .query(&records, &options(&[("sort", "preis")]))
        .unwrap_err();
    assert_eq!(err.code(), 201);
    assert_eq!(err.to_string(), "Invalid sorting option: \"preis\"");
}
