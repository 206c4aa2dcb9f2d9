//! Named ports with fixed parameters.

use crate::config::schema::RuleConfig;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    QMetaMethodSignature,
    QtEscape,
    Atomics,
    QImageText,
    QAbstractItemViewDataChanged,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::QMetaMethodSignature,
        Preset::QtEscape,
        Preset::Atomics,
        Preset::QImageText,
        Preset::QAbstractItemViewDataChanged,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::QMetaMethodSignature => "qmetamethod-signature",
            Preset::QtEscape => "qt-escape",
            Preset::Atomics => "atomics",
            Preset::QImageText => "qimage-text",
            Preset::QAbstractItemViewDataChanged => "qabstractitemview-datachanged",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Preset::QMetaMethodSignature => {
                "QMetaMethod::signature() -> QMetaMethod::methodSignature()"
            }
            Preset::QtEscape => "Qt::escape(s) -> QString(s).toHtmlEscaped()",
            Preset::Atomics => "implicit QAtomicInt conversions -> explicit load()",
            Preset::QImageText => "drop the language argument of QImage::text/setText",
            Preset::QAbstractItemViewDataChanged => {
                "add the roles parameter to dataChanged overrides"
            }
        }
    }

    pub fn rule(self) -> RuleConfig {
        match self {
            Preset::QMetaMethodSignature => RuleConfig::RenameMethod {
                class: "QMetaMethod".to_string(),
                old_name: "signature".to_string(),
                new_name: "methodSignature".to_string(),
            },
            Preset::QtEscape => RuleConfig::Escape {
                type_name: "QString".to_string(),
                method: "toHtmlEscaped".to_string(),
            },
            Preset::Atomics => RuleConfig::Accessor {
                accessor: "load".to_string(),
                wrap_type: None,
            },
            Preset::QImageText => RuleConfig::RemoveArguments,
            Preset::QAbstractItemViewDataChanged => RuleConfig::TrailingArgument {
                container: "QVector<int>".to_string(),
                parameter_name: "roles".to_string(),
            },
        }
    }

    /// Closest preset name, for "did you mean" hints.
    pub fn suggest(name: &str) -> Option<Preset> {
        Preset::ALL
            .into_iter()
            .map(|preset| (preset, strsim::jaro_winkler(name, preset.name())))
            .filter(|(_, score)| *score > 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(preset, _)| preset)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| format!("unknown preset '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::RuleFamily;

    #[test]
    fn presets_map_to_families() {
        assert_eq!(Preset::Atomics.rule().family(), RuleFamily::Accessor);
        assert_eq!(Preset::QtEscape.rule().family(), RuleFamily::Escape);
        assert_eq!(
            Preset::QAbstractItemViewDataChanged.rule().family(),
            RuleFamily::TrailingArgument
        );
    }

    #[test]
    fn misspelled_preset_gets_suggestion() {
        assert_eq!(Preset::suggest("qt-escpe"), Some(Preset::QtEscape));
        assert_eq!(Preset::suggest("zzzz"), None);
    }
}
