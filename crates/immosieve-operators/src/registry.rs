//! Field registry: the only vocabulary filters and sort specs may use.
//!
//! Accessors return `Ok(None)` when an optional attribute is absent and
//! `Err(AccessError)` when a sub-record they cannot work without is missing.
//! The first is ordinary data; the second means the record is broken.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use thiserror::Error;

use immosieve_core::record::{Mietdauer, RealEstate};
use immosieve_core::value::{Value, ValueType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record has no '{missing}' section")]
pub struct AccessError {
    pub missing: &'static str,
}

pub type Extracted = Result<Option<Value>, AccessError>;

pub struct FieldDescriptor {
    pub name: &'static str,
    /// Explicit cast applied to query operands for this field.
    pub declared_type: Option<ValueType>,
    /// List-valued fields cannot be sort keys.
    pub sortable: bool,
    extract: fn(&RealEstate) -> Extracted,
}

impl FieldDescriptor {
    pub fn extract(&self, record: &RealEstate) -> Extracted {
        (self.extract)(record)
    }
}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("sortable", &self.sortable)
            .finish()
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Serialize for FieldDescriptor {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.name)
    }
}

const fn field(name: &'static str, extract: fn(&RealEstate) -> Extracted) -> FieldDescriptor {
    FieldDescriptor {
        name,
        declared_type: None,
        sortable: true,
        extract,
    }
}

const fn typed_field(
    name: &'static str,
    declared_type: ValueType,
    extract: fn(&RealEstate) -> Extracted,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        declared_type: Some(declared_type),
        sortable: true,
        extract,
    }
}

const fn list_field(name: &'static str, extract: fn(&RealEstate) -> Extracted) -> FieldDescriptor {
    FieldDescriptor {
        name,
        declared_type: None,
        sortable: false,
        extract,
    }
}

pub static FIELDS: &[FieldDescriptor] = &[
    field("objektart", objektart),
    list_field("objekttyp", objekttyp),
    field("land", land),
    field("ort", ort),
    field("ortsteil", ortsteil),
    typed_field("plz", ValueType::Str, plz),
    field("strasse", strasse),
    typed_field("hausnummer", ValueType::Str, hausnummer),
    field("zimmer", zimmer),
    field("etage", etage),
    field("etagen", etagen),
    field("wohnflaeche", wohnflaeche),
    field("grundstuecksflaeche", grundstuecksflaeche),
    field("balkone", balkone),
    field("terrassen", terrassen),
    field("kaltmiete", kaltmiete),
    field("warmmiete", warmmiete),
    field("nebenkosten", nebenkosten),
    field("kaufpreis", kaufpreis),
    field("pacht", pacht),
    field("erbpacht", erbpacht),
    field("miete", miete),
    field("aussen_courtage", aussen_courtage),
    field("innen_courtage", innen_courtage),
    typed_field("openimmo_obid", ValueType::Str, openimmo_obid),
    typed_field("objektnr_intern", ValueType::Str, objektnr_intern),
    typed_field("objektnr_extern", ValueType::Str, objektnr_extern),
    field("barrierefrei", barrierefrei),
    field("haustiere", haustiere),
    field("raucher", raucher),
    field("kaufbar", kaufbar),
    field("mietbar", mietbar),
    field("erbpachtbar", erbpachtbar),
    field("leasing", leasing),
    field("verfuegbar_ab", verfuegbar_ab),
    typed_field("abdatum", ValueType::Date, abdatum),
    field("moebliert", moebliert),
    field("seniorengerecht", seniorengerecht),
    typed_field("baujahr", ValueType::Str, baujahr),
    field("zustand", zustand),
    field("epart", epart),
    field("energieverbrauchkennwert", energieverbrauchkennwert),
    field("endenergiebedarf", endenergiebedarf),
    field("primaerenergietraeger", primaerenergietraeger),
    field("stromwert", stromwert),
    field("waermewert", waermewert),
    field("wertklasse", wertklasse),
    field("min_mietdauer", min_mietdauer),
    field("max_mietdauer", max_mietdauer),
    field("laufzeit", laufzeit),
    field("max_personen", max_personen),
];

static INDEX: Lazy<HashMap<&'static str, &'static FieldDescriptor>> =
    Lazy::new(|| FIELDS.iter().map(|d| (d.name, d)).collect());

/// Resolve a field name. Names are case-sensitive.
pub fn lookup(name: &str) -> Option<&'static FieldDescriptor> {
    INDEX.get(name).copied()
}

// ----- helpers -----

fn required<'a, T>(part: &'a Option<T>, name: &'static str) -> Result<&'a T, AccessError> {
    part.as_ref().ok_or(AccessError { missing: name })
}

/// Non-empty strings only.
fn text(s: &Option<String>) -> Option<Value> {
    s.as_deref().filter(|s| !s.is_empty()).map(Value::from)
}

/// Prices of zero are treated as "not given".
fn amount(x: Option<f64>) -> Option<Value> {
    x.filter(|v| *v != 0.0).map(Value::Float)
}

fn mietdauer(d: &Option<Mietdauer>) -> Option<Value> {
    d.as_ref().and_then(Mietdauer::display).map(Value::Str)
}

// ----- objektkategorie -----

fn objektart(r: &RealEstate) -> Extracted {
    Ok(text(&required(&r.objektkategorie, "objektkategorie")?.objektart))
}

fn objekttyp(r: &RealEstate) -> Extracted {
    let kat = required(&r.objektkategorie, "objektkategorie")?;
    Ok(Some(Value::List(
        kat.objekttypen
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| Value::Str(t.clone()))
            .collect(),
    )))
}

fn kaufbar(r: &RealEstate) -> Extracted {
    let kat = required(&r.objektkategorie, "objektkategorie")?;
    Ok(Some(Value::Bool(kat.vermarktungsart.kauf)))
}

fn mietbar(r: &RealEstate) -> Extracted {
    let kat = required(&r.objektkategorie, "objektkategorie")?;
    Ok(Some(Value::Bool(kat.vermarktungsart.miete_pacht)))
}

fn erbpachtbar(r: &RealEstate) -> Extracted {
    let kat = required(&r.objektkategorie, "objektkategorie")?;
    Ok(Some(Value::Bool(kat.vermarktungsart.erbpacht)))
}

fn leasing(r: &RealEstate) -> Extracted {
    let kat = required(&r.objektkategorie, "objektkategorie")?;
    Ok(Some(Value::Bool(kat.vermarktungsart.leasing)))
}

// ----- geo -----

fn land(r: &RealEstate) -> Extracted {
    Ok(r.geo.as_ref().and_then(|g| text(&g.iso_land)))
}

fn ort(r: &RealEstate) -> Extracted {
    Ok(text(&required(&r.geo, "geo")?.ort))
}

fn ortsteil(r: &RealEstate) -> Extracted {
    Ok(text(&required(&r.geo, "geo")?.regionaler_zusatz))
}

fn plz(r: &RealEstate) -> Extracted {
    Ok(text(&required(&r.geo, "geo")?.plz))
}

fn strasse(r: &RealEstate) -> Extracted {
    Ok(text(&required(&r.geo, "geo")?.strasse))
}

fn hausnummer(r: &RealEstate) -> Extracted {
    Ok(text(&required(&r.geo, "geo")?.hausnummer))
}

fn etage(r: &RealEstate) -> Extracted {
    Ok(required(&r.geo, "geo")?.etage.map(Value::Int))
}

fn etagen(r: &RealEstate) -> Extracted {
    Ok(required(&r.geo, "geo")?.anzahl_etagen.map(Value::Int))
}

// ----- flaechen -----

fn zimmer(r: &RealEstate) -> Extracted {
    Ok(required(&r.flaechen, "flaechen")?.anzahl_zimmer.map(Value::Float))
}

fn wohnflaeche(r: &RealEstate) -> Extracted {
    Ok(r.flaechen.as_ref().and_then(|f| f.wohnflaeche).map(Value::Float))
}

fn grundstuecksflaeche(r: &RealEstate) -> Extracted {
    Ok(r.flaechen.as_ref().and_then(|f| f.grundstuecksflaeche).map(Value::Float))
}

fn balkone(r: &RealEstate) -> Extracted {
    Ok(r.flaechen.as_ref().and_then(|f| f.anzahl_balkone).map(Value::Float))
}

fn terrassen(r: &RealEstate) -> Extracted {
    Ok(r.flaechen.as_ref().and_then(|f| f.anzahl_terrassen).map(Value::Float))
}

// ----- preise -----

fn kaltmiete(r: &RealEstate) -> Extracted {
    // zero is a real cold rent, unlike the other amounts
    Ok(r.preise.as_ref().and_then(|p| p.kaltmiete).map(Value::Float))
}

fn warmmiete(r: &RealEstate) -> Extracted {
    Ok(r.preise.as_ref().and_then(|p| amount(p.warmmiete)))
}

fn nebenkosten(r: &RealEstate) -> Extracted {
    Ok(r.preise.as_ref().and_then(|p| amount(p.nebenkosten)))
}

fn kaufpreis(r: &RealEstate) -> Extracted {
    Ok(r.preise.as_ref().and_then(|p| amount(p.kaufpreis)))
}

fn pacht(r: &RealEstate) -> Extracted {
    Ok(r.preise.as_ref().and_then(|p| amount(p.pacht)))
}

fn erbpacht(r: &RealEstate) -> Extracted {
    Ok(r.preise.as_ref().and_then(|p| amount(p.erbpacht)))
}

/// Effective rent: warm rent, else cold rent, else net cold rent.
fn miete(r: &RealEstate) -> Extracted {
    Ok(r.preise.as_ref().and_then(|p| {
        amount(p.warmmiete)
            .or_else(|| p.kaltmiete.map(Value::Float))
            .or_else(|| amount(p.nettokaltmiete))
    }))
}

fn aussen_courtage(r: &RealEstate) -> Extracted {
    Ok(r.preise.as_ref().and_then(|p| text(&p.aussen_courtage)))
}

fn innen_courtage(r: &RealEstate) -> Extracted {
    Ok(r.preise.as_ref().and_then(|p| text(&p.innen_courtage)))
}

// ----- verwaltung_techn -----

fn openimmo_obid(r: &RealEstate) -> Extracted {
    let techn = required(&r.verwaltung_techn, "verwaltung_techn")?;
    Ok(Some(Value::Str(techn.openimmo_obid.clone())))
}

fn objektnr_intern(r: &RealEstate) -> Extracted {
    Ok(text(&required(&r.verwaltung_techn, "verwaltung_techn")?.objektnr_intern))
}

fn objektnr_extern(r: &RealEstate) -> Extracted {
    let techn = required(&r.verwaltung_techn, "verwaltung_techn")?;
    Ok(Some(Value::Str(techn.objektnr_extern.clone())))
}

// ----- ausstattung -----

fn barrierefrei(r: &RealEstate) -> Extracted {
    let flag = r.ausstattung.as_ref().and_then(|a| a.barrierefrei);
    Ok(Some(Value::Bool(flag.unwrap_or(false))))
}

fn seniorengerecht(r: &RealEstate) -> Extracted {
    let flag = r.ausstattung.as_ref().and_then(|a| a.seniorengerecht);
    Ok(Some(Value::Bool(flag.unwrap_or(false))))
}

/// Furnishing kind when given, `true` for furnished without detail.
fn moebliert(r: &RealEstate) -> Extracted {
    let ausstattung = required(&r.ausstattung, "ausstattung")?;
    Ok(Some(match &ausstattung.moebliert {
        Some(m) => text(&m.moeb).unwrap_or(Value::Bool(true)),
        None => Value::Bool(false),
    }))
}

// ----- verwaltung_objekt -----

fn haustiere(r: &RealEstate) -> Extracted {
    let flag = r.verwaltung_objekt.as_ref().and_then(|v| v.haustiere);
    Ok(Some(Value::Bool(flag.unwrap_or(false))))
}

fn raucher(r: &RealEstate) -> Extracted {
    let nichtraucher = r.verwaltung_objekt.as_ref().and_then(|v| v.nichtraucher);
    Ok(Some(Value::Bool(!nichtraucher.unwrap_or(false))))
}

fn verfuegbar_ab(r: &RealEstate) -> Extracted {
    Ok(text(&required(&r.verwaltung_objekt, "verwaltung_objekt")?.verfuegbar_ab))
}

fn abdatum(r: &RealEstate) -> Extracted {
    let verwaltung = required(&r.verwaltung_objekt, "verwaltung_objekt")?;
    Ok(verwaltung.abdatum.map(Value::from))
}

fn min_mietdauer(r: &RealEstate) -> Extracted {
    Ok(r.verwaltung_objekt.as_ref().and_then(|v| mietdauer(&v.min_mietdauer)))
}

fn max_mietdauer(r: &RealEstate) -> Extracted {
    Ok(r.verwaltung_objekt.as_ref().and_then(|v| mietdauer(&v.max_mietdauer)))
}

fn laufzeit(r: &RealEstate) -> Extracted {
    Ok(r.verwaltung_objekt.as_ref().and_then(|v| amount(v.laufzeit)))
}

fn max_personen(r: &RealEstate) -> Extracted {
    Ok(r
        .verwaltung_objekt
        .as_ref()
        .and_then(|v| v.max_personen)
        .filter(|n| *n != 0)
        .map(Value::Int))
}

// ----- zustand_angaben -----

fn baujahr(r: &RealEstate) -> Extracted {
    Ok(r.zustand_angaben.as_ref().and_then(|z| text(&z.baujahr)))
}

fn zustand(r: &RealEstate) -> Extracted {
    Ok(r.zustand_angaben.as_ref().and_then(|z| text(&z.zustand_art)))
}

fn energiepass<F>(r: &RealEstate, pick: F) -> Extracted
where
    F: Fn(&immosieve_core::record::Energiepass) -> &Option<String>,
{
    Ok(r
        .zustand_angaben
        .as_ref()
        .and_then(|z| z.energiepass.as_ref())
        .and_then(|e| text(pick(e))))
}

fn epart(r: &RealEstate) -> Extracted {
    energiepass(r, |e| &e.epart)
}

fn energieverbrauchkennwert(r: &RealEstate) -> Extracted {
    energiepass(r, |e| &e.energieverbrauchkennwert)
}

fn endenergiebedarf(r: &RealEstate) -> Extracted {
    energiepass(r, |e| &e.endenergiebedarf)
}

fn primaerenergietraeger(r: &RealEstate) -> Extracted {
    energiepass(r, |e| &e.primaerenergietraeger)
}

fn stromwert(r: &RealEstate) -> Extracted {
    energiepass(r, |e| &e.stromwert)
}

fn waermewert(r: &RealEstate) -> Extracted {
    energiepass(r, |e| &e.waermewert)
}

fn wertklasse(r: &RealEstate) -> Extracted {
    energiepass(r, |e| &e.wertklasse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use immosieve_core::record::{Geo, Objektkategorie, Preise, VerwaltungObjekt};

    #[test]
    fn test_names_are_unique() {
        assert_eq!(INDEX.len(), FIELDS.len());
    }

    #[test]
    fn test_unknown_field() {
        assert!(lookup("zimmer").is_some());
        assert!(lookup("Zimmer").is_none());
        assert!(lookup("swimmingpool").is_none());
    }

    #[test]
    fn test_absent_vs_broken() {
        let r = RealEstate::default();
        // optional sub-record: silently absent
        assert_eq!(lookup("kaltmiete").unwrap().extract(&r), Ok(None));
        // mandatory sub-record: broken wiring
        assert_eq!(
            lookup("ort").unwrap().extract(&r),
            Err(AccessError { missing: "geo" })
        );
    }

    #[test]
    fn test_amenity_defaults() {
        let r = RealEstate::default();
        assert_eq!(lookup("raucher").unwrap().extract(&r), Ok(Some(Value::Bool(true))));
        assert_eq!(lookup("haustiere").unwrap().extract(&r), Ok(Some(Value::Bool(false))));

        let r = RealEstate {
            verwaltung_objekt: Some(VerwaltungObjekt {
                nichtraucher: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(lookup("raucher").unwrap().extract(&r), Ok(Some(Value::Bool(false))));
    }

    #[test]
    fn test_miete_fallback_chain() {
        let miete = lookup("miete").unwrap();
        let mut preise = Preise {
            warmmiete: Some(900.0),
            kaltmiete: Some(700.0),
            nettokaltmiete: Some(650.0),
            ..Default::default()
        };
        let with = |p: &Preise| RealEstate {
            preise: Some(p.clone()),
            ..Default::default()
        };
        assert_eq!(miete.extract(&with(&preise)), Ok(Some(Value::Float(900.0))));
        preise.warmmiete = Some(0.0);
        assert_eq!(miete.extract(&with(&preise)), Ok(Some(Value::Float(700.0))));
        preise.kaltmiete = None;
        assert_eq!(miete.extract(&with(&preise)), Ok(Some(Value::Float(650.0))));
        preise.nettokaltmiete = None;
        assert_eq!(miete.extract(&with(&preise)), Ok(None));
    }

    #[test]
    fn test_objekttyp_is_list() {
        let r = RealEstate {
            objektkategorie: Some(Objektkategorie {
                objektart: Some("wohnung".into()),
                objekttypen: vec!["DACHGESCHOSS".into(), String::new()],
                ..Default::default()
            }),
            geo: Some(Geo::default()),
            ..Default::default()
        };
        assert_eq!(
            lookup("objekttyp").unwrap().extract(&r),
            Ok(Some(Value::List(vec![Value::Str("DACHGESCHOSS".into())])))
        );
        assert!(!lookup("objekttyp").unwrap().sortable);
        assert_eq!(lookup("plz").unwrap().extract(&r), Ok(None));
    }
}
