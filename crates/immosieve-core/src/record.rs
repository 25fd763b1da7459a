//! Listing records, modelled on the OpenImmo `immobilie` element.
//!
//! Every sub-record is optional because real feeds omit them freely. The field
//! registry decides which absences are normal and which mean broken wiring.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealEstate {
    pub objektkategorie: Option<Objektkategorie>,
    pub geo: Option<Geo>,
    pub preise: Option<Preise>,
    pub flaechen: Option<Flaechen>,
    pub ausstattung: Option<Ausstattung>,
    pub zustand_angaben: Option<ZustandAngaben>,
    pub verwaltung_objekt: Option<VerwaltungObjekt>,
    pub verwaltung_techn: Option<VerwaltungTechn>,
    pub freitexte: Option<Freitexte>,
    pub anhaenge: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Objektkategorie {
    /// Object kind such as `wohnung`, `haus`, or `buero_praxen`.
    pub objektart: Option<String>,
    /// Subtypes of the object kind (`wohnungtyp`, `haustyp`, ...).
    pub objekttypen: Vec<String>,
    pub vermarktungsart: Vermarktungsart,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vermarktungsart {
    pub kauf: bool,
    pub miete_pacht: bool,
    pub erbpacht: bool,
    pub leasing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geo {
    pub plz: Option<String>,
    pub ort: Option<String>,
    pub regionaler_zusatz: Option<String>,
    pub strasse: Option<String>,
    pub hausnummer: Option<String>,
    /// ISO 3166 alpha-3 country code.
    pub iso_land: Option<String>,
    pub etage: Option<i64>,
    pub anzahl_etagen: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preise {
    pub kaltmiete: Option<f64>,
    pub warmmiete: Option<f64>,
    pub nettokaltmiete: Option<f64>,
    pub nebenkosten: Option<f64>,
    pub kaufpreis: Option<f64>,
    pub pacht: Option<f64>,
    pub erbpacht: Option<f64>,
    pub aussen_courtage: Option<String>,
    pub innen_courtage: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flaechen {
    pub anzahl_zimmer: Option<f64>,
    pub wohnflaeche: Option<f64>,
    pub grundstuecksflaeche: Option<f64>,
    pub anzahl_balkone: Option<f64>,
    pub anzahl_terrassen: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ausstattung {
    pub barrierefrei: Option<bool>,
    pub seniorengerecht: Option<bool>,
    pub moebliert: Option<Moebliert>,
}

/// `moebliert` element: present means furnished, `moeb` says how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Moebliert {
    pub moeb: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZustandAngaben {
    pub baujahr: Option<String>,
    pub zustand_art: Option<String>,
    pub energiepass: Option<Energiepass>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Energiepass {
    pub epart: Option<String>,
    pub energieverbrauchkennwert: Option<String>,
    pub endenergiebedarf: Option<String>,
    pub primaerenergietraeger: Option<String>,
    pub stromwert: Option<String>,
    pub waermewert: Option<String>,
    pub wertklasse: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerwaltungObjekt {
    pub haustiere: Option<bool>,
    pub nichtraucher: Option<bool>,
    pub verfuegbar_ab: Option<String>,
    pub abdatum: Option<NaiveDate>,
    pub min_mietdauer: Option<Mietdauer>,
    pub max_mietdauer: Option<Mietdauer>,
    pub laufzeit: Option<f64>,
    pub max_personen: Option<i64>,
}

/// Rental period with an optional unit such as `MONAT` or `JAHR`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mietdauer {
    pub wert: Option<String>,
    pub einheit: Option<String>,
}

impl Mietdauer {
    /// `"<wert> <einheit>"`, or just the value when the unit is missing.
    pub fn display(&self) -> Option<String> {
        let wert = self.wert.as_deref().filter(|w| !w.is_empty())?;
        Some(match self.einheit.as_deref().filter(|e| !e.is_empty()) {
            Some(einheit) => format!("{} {}", wert, einheit),
            None => wert.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerwaltungTechn {
    pub openimmo_obid: String,
    pub objektnr_intern: Option<String>,
    pub objektnr_extern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Freitexte {
    pub objekttitel: Option<String>,
    pub lage: Option<String>,
    pub ausstatt_beschr: Option<String>,
    pub objektbeschreibung: Option<String>,
    pub sonstige_angaben: Option<String>,
}

impl RealEstate {
    /// Copy without the parts a query did not ask for.
    pub fn projected(&self, freitexte: bool, attachments: bool) -> RealEstate {
        RealEstate {
            freitexte: if freitexte { self.freitexte.clone() } else { None },
            anhaenge: if attachments { self.anhaenge.clone() } else { Vec::new() },
            ..self.clone()
        }
    }
}
