use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "kebab-case")]
pub enum CenterId {
  SantoDomingo,
  Santiago
}

impl CenterId {
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::SantoDomingo => {
        "santo-domingo"
      }
      | Self::Santiago => "santiago"
    }
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "santo-domingo"
      | "santo_domingo" => {
        Some(Self::SantoDomingo)
      }
      | "santiago" => {
        Some(Self::Santiago)
      }
      | _ => None
    }
  }
}

/// An event as delivered by the
/// event-data backend, before any
/// validation.
///
/// Every field may be absent or
/// `null`; the normalizer decides what
/// a missing value means and rejects
/// records without a date or capacity.
#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct RawEvent {
  #[serde(default)]
  pub id:              Option<String>,
  #[serde(default)]
  pub title:           Option<String>,
  #[serde(default)]
  pub date:            Option<String>,
  #[serde(default)]
  pub time:            Option<String>,
  #[serde(default)]
  pub category:        String,
  #[serde(default)]
  pub location:        Option<String>,
  #[serde(default)]
  pub center:          Option<String>,
  #[serde(default)]
  pub capacity:        Option<i64>,
  #[serde(
    default,
    alias = "current_attendees"
  )]
  pub attendees:       Option<i64>,
  #[serde(default)]
  pub available_spots: Option<i64>,
  #[serde(default)]
  pub price:           Option<f64>,
  #[serde(default)]
  pub published:       Option<bool>
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserializes_backend_event_payload(
  ) {
    let raw = r#"{
      "id": "evt-1",
      "title": "Concierto de Jazz",
      "category": "Conciertos",
      "date": "2025-07-15",
      "time": "20:30",
      "capacity": 300,
      "location": "Teatro Principal",
      "center": "santiago",
      "available_spots": 120,
      "price": 0.0,
      "published": true,
      "created_at": "2025-06-01T10:00:00"
    }"#;

    let event: RawEvent =
      serde_json::from_str(raw)
        .expect("valid payload");

    assert_eq!(
      event.id.as_deref(),
      Some("evt-1")
    );
    assert_eq!(event.capacity, Some(300));
    assert_eq!(
      event.available_spots,
      Some(120)
    );
    assert_eq!(event.attendees, None);
    assert_eq!(
      event
        .center
        .as_deref()
        .and_then(CenterId::from_key),
      Some(CenterId::Santiago)
    );
  }

  #[test]
  fn accepts_current_attendees_alias() {
    let raw = r#"{
      "category": "Talleres",
      "date": "2025-07-15",
      "capacity": 20,
      "current_attendees": 19
    }"#;

    let event: RawEvent =
      serde_json::from_str(raw)
        .expect("valid payload");

    assert_eq!(event.attendees, Some(19));
    assert_eq!(event.title, None);
  }

  #[test]
  fn null_and_absent_capacity_stay_distinct_from_zero(
  ) {
    let absent: RawEvent =
      serde_json::from_str(
        r#"{"date": "2025-07-15"}"#
      )
      .expect("valid payload");
    let null: RawEvent =
      serde_json::from_str(
        r#"{"capacity": null}"#
      )
      .expect("valid payload");
    let zero: RawEvent =
      serde_json::from_str(
        r#"{"capacity": 0}"#
      )
      .expect("valid payload");

    assert_eq!(absent.capacity, None);
    assert_eq!(null.capacity, None);
    assert_eq!(zero.capacity, Some(0));
  }

  #[test]
  fn center_keys_round_trip() {
    for center in [
      CenterId::SantoDomingo,
      CenterId::Santiago
    ] {
      assert_eq!(
        CenterId::from_key(
          center.as_key()
        ),
        Some(center)
      );
    }
    assert_eq!(
      CenterId::from_key("madrid"),
      None
    );
  }
}
