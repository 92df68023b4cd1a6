// src/model.rs
//! Typed records that flow through the pipeline, plus the JSON archive shape.
//!
//! Internally every optional value is an `Option`; the `---` placeholder only
//! exists at render time (text blocks, archives, reports).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::consts::PLACEHOLDER;
use crate::core::dates::{format_date, parse_block_date, parse_day_first};

/// One open order after normalization. Blank cells are `None`, never `Some("")`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceOrder {
    /// Opaque id, kept as text so large or zero-padded ids survive.
    pub order_id: String,
    pub fleet_id: Option<String>,
    pub model: Option<String>,
    pub requester: Option<String>,
    pub provider: Option<String>,
    pub entry_date: NaiveDate,
    pub estimated_exit_date: Option<NaiveDate>,
    pub service_description: Option<String>,
}

/// Release authority found in the service description.
/// Priority between markers lives in `classify::MARKERS`, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasedBy {
    Mauricio,
    Gestor,
    Unclassified,
}

impl ReleasedBy {
    pub const ALL: [ReleasedBy; 3] = [ReleasedBy::Mauricio, ReleasedBy::Gestor, ReleasedBy::Unclassified];

    pub fn tag(self) -> &'static str {
        match self {
            ReleasedBy::Mauricio => "mauricio",
            ReleasedBy::Gestor => "gestor",
            ReleasedBy::Unclassified => "unclassified",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.tag().eq_ignore_ascii_case(tag.trim()))
    }

    pub fn label(self) -> &'static str {
        match self {
            ReleasedBy::Mauricio => "Sr. Mauricio",
            ReleasedBy::Gestor => "Gestor",
            ReleasedBy::Unclassified => "Não classificado",
        }
    }
}

impl fmt::Display for ReleasedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedOrder {
    pub order: ServiceOrder,
    pub released_by: ReleasedBy,
    pub missing_estimate: bool,
}

/* ---------------- Archive (JSON) shape ---------------- */

/// One element of a group archive. Every key is optional on read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub frota: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub modelo: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub solicitante: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub data_entrada: Option<String>,
    #[serde(default, alias = "data", deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub previsao_saida: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub prestador: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub servico: Option<String>,
    #[serde(default, deserialize_with = "release_tag", skip_serializing_if = "Option::is_none")]
    pub liberado_por: Option<ReleasedBy>,
    #[serde(default, deserialize_with = "loose_flag", skip_serializing_if = "Option::is_none")]
    pub sem_previsao: Option<bool>,
}

/// Any JSON scalar as text: `"123"`, `123` and `123.0` all read as "123".
fn scalar_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Some(other) => Some(other.to_string()),
    })
}

/// Release tag in any case; an unknown tag reads as `Unclassified`.
fn release_tag<'de, D>(de: D) -> Result<Option<ReleasedBy>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(ReleasedBy::from_tag(&s).unwrap_or(ReleasedBy::Unclassified)),
        Some(_) => Some(ReleasedBy::Unclassified),
    })
}

/// `true`/`false`, or their text forms. Anything else is treated as absent.
fn loose_flag<'de, D>(de: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => s.trim().to_ascii_lowercase().parse().ok(),
        _ => None,
    })
}

impl From<&ClassifiedOrder> for ArchiveRecord {
    fn from(c: &ClassifiedOrder) -> Self {
        let o = &c.order;
        Self {
            os: Some(o.order_id.clone()),
            frota: o.fleet_id.clone(),
            modelo: o.model.clone(),
            solicitante: o.requester.clone(),
            data_entrada: Some(format_date(o.entry_date)),
            previsao_saida: Some(o.estimated_exit_date.map(format_date).unwrap_or_else(|| s!(PLACEHOLDER))),
            prestador: Some(or_placeholder!(o.provider.as_deref())),
            servico: o.service_description.clone(),
            liberado_por: Some(c.released_by),
            sem_previsao: Some(c.missing_estimate),
        }
    }
}

impl ArchiveRecord {
    /// Text for a report cell: the value, or the placeholder when absent or blank.
    pub fn show(value: &Option<String>) -> &str {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => PLACEHOLDER,
        }
    }

    /// Rebuild the typed order. Fails only when the entry date is absent or unreadable.
    pub fn to_classified(&self) -> Option<ClassifiedOrder> {
        let present = |v: &Option<String>| {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty() && *s != PLACEHOLDER).map(str::to_string)
        };
        let date = |v: &Option<String>| {
            present(v).and_then(|s| parse_block_date(&s).or_else(|| parse_day_first(&s)))
        };
        let order = ServiceOrder {
            order_id: present(&self.os).unwrap_or_default(),
            fleet_id: present(&self.frota),
            model: present(&self.modelo),
            requester: present(&self.solicitante),
            provider: present(&self.prestador),
            entry_date: date(&self.data_entrada)?,
            estimated_exit_date: date(&self.previsao_saida),
            service_description: present(&self.servico),
        };
        let missing_estimate = order.estimated_exit_date.is_none();
        Some(ClassifiedOrder {
            order,
            released_by: self.liberado_por.unwrap_or(ReleasedBy::Unclassified),
            missing_estimate: self.sem_previsao.unwrap_or(missing_estimate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassifiedOrder {
        ClassifiedOrder {
            order: ServiceOrder {
                order_id: s!("000123"),
                fleet_id: Some(s!("F-10")),
                model: Some(s!("Volvo FH")),
                requester: Some(s!("Carlos")),
                provider: None,
                entry_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
                estimated_exit_date: None,
                service_description: Some(s!("Troca de embreagem")),
            },
            released_by: ReleasedBy::Unclassified,
            missing_estimate: true,
        }
    }

    #[test]
    fn archive_record_uses_canonical_keys_and_placeholders() {
        let json = serde_json::to_value(ArchiveRecord::from(&sample())).unwrap();
        assert_eq!(json["os"], "000123");
        assert_eq!(json["data_entrada"], "02/04/2025");
        assert_eq!(json["previsao_saida"], PLACEHOLDER);
        assert_eq!(json["prestador"], PLACEHOLDER);
        assert_eq!(json["liberado_por"], "unclassified");
    }

    #[test]
    fn reader_tolerates_numeric_ids_and_legacy_keys() {
        let rec: ArchiveRecord =
            serde_json::from_str(r#"{"os": 4521.0, "data": "10/05/2025", "frota": "F-1"}"#).unwrap();
        assert_eq!(rec.os.as_deref(), Some("4521"));
        assert_eq!(rec.previsao_saida.as_deref(), Some("10/05/2025"));
        assert_eq!(ArchiveRecord::show(&rec.servico), PLACEHOLDER);
        assert_eq!(rec.liberado_por, None);
    }

    #[test]
    fn reader_turns_numeric_text_fields_into_strings() {
        let rec: ArchiveRecord = serde_json::from_str(
            r#"{"os": 1, "frota": 123, "modelo": 2024, "prestador": 77, "data_entrada": "01/04/2025"}"#,
        )
        .unwrap();
        assert_eq!(rec.frota.as_deref(), Some("123"));
        assert_eq!(rec.modelo.as_deref(), Some("2024"));
        assert_eq!(rec.prestador.as_deref(), Some("77"));
        assert!(rec.to_classified().is_some());
    }

    #[test]
    fn reader_matches_release_tags_in_any_case() {
        let rec: ArchiveRecord = serde_json::from_str(r#"{"os": 2, "liberado_por": "Mauricio"}"#).unwrap();
        assert_eq!(rec.liberado_por, Some(ReleasedBy::Mauricio));
        let rec: ArchiveRecord = serde_json::from_str(r#"{"os": 3, "liberado_por": "diretoria"}"#).unwrap();
        assert_eq!(rec.liberado_por, Some(ReleasedBy::Unclassified));
        let rec: ArchiveRecord = serde_json::from_str(r#"{"os": 4, "sem_previsao": "TRUE"}"#).unwrap();
        assert_eq!(rec.sem_previsao, Some(true));
    }

    #[test]
    fn archive_round_trip_restores_typed_order() {
        let c = sample();
        let back = ArchiveRecord::from(&c).to_classified().unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn released_by_tags_round_trip() {
        for r in ReleasedBy::ALL {
            assert_eq!(ReleasedBy::from_tag(r.tag()), Some(r));
        }
    }
}
