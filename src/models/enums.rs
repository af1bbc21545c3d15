use crate::db::DatabaseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Wire and storage form is the string literal.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(Severity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(Urgency {
    Routine => "routine",
    Urgent => "urgent",
    Emergency => "emergency",
});

// Every specialty the analysis pipeline may emit must be listed here.
str_enum!(Specialty {
    GeneralMedicine => "General Medicine",
    Cardiology => "Cardiology",
    Dermatology => "Dermatology",
    Orthopedics => "Orthopedics",
    Pediatrics => "Pediatrics",
    Gynecology => "Gynecology",
    Ophthalmology => "Ophthalmology",
    Dentistry => "Dentistry",
    Psychiatry => "Psychiatry",
    Neurology => "Neurology",
    Ent => "ENT",
    Urology => "Urology",
    EmergencyMedicine => "Emergency Medicine",
    Pulmonology => "Pulmonology",
    Gastroenterology => "Gastroenterology",
    Endocrinology => "Endocrinology",
});

impl Specialty {
    /// Lenient catalog lookup for labels coming from a model or a query string.
    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(wanted))
    }
}

str_enum!(AnalysisSource {
    Model => "model",
    Fallback => "fallback",
});

str_enum!(QueueEntryStatus {
    Waiting => "waiting",
    Served => "served",
});
