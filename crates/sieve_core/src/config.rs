//! Typed option sections.
//!
//! A [`Configuration`] declares a fixed set of typed options and holds one
//! anonymous [`Section`] plus any number of named ones. A section maps option
//! names to values and carries free (positional) arguments. There is no
//! command-line grammar here; sections are filled in programmatically or
//! deserialized from a JSON dump.

use crate::error::{CoreError, CoreResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved name of the anonymous section
pub const ANONYMOUS_SECTION: &str = "anonymous";

/// Type of value an option accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    /// UTF-8 string
    String,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit float
    Double,
    /// Boolean flag
    Boolean,
    /// Map from key to scalar value
    Map,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// Value assigned to an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Float value
    Double(f64),
    /// String value
    String(String),
    /// Map value; entries are always scalars
    Map(IndexMap<String, OptionValue>),
}

impl OptionValue {
    /// Kind of this value
    #[must_use]
    pub fn kind(&self) -> OptionKind {
        match self {
            Self::Boolean(_) => OptionKind::Boolean,
            Self::Integer(_) => OptionKind::Integer,
            Self::Double(_) => OptionKind::Double,
            Self::String(_) => OptionKind::String,
            Self::Map(_) => OptionKind::Map,
        }
    }

    /// Is this a scalar (non-map) value
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Map(_))
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Double(d) => write!(f, "{:?}", d),
            Self::String(s) => f.write_str(&escape_string(s)),
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Quote a string and escape backslash, newline, tab and quote
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Declaration of a typed option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Option name
    pub name: String,
    /// Accepted value kind
    pub kind: OptionKind,
    /// Value used when a section assigns none
    pub default: Option<OptionValue>,
    /// One-line description
    pub description: String,
}

impl OptionSpec {
    /// Create an option without default
    #[must_use]
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            description: String::new(),
        }
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn expect_kind(&self, kind: OptionKind) -> CoreResult<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(CoreError::Configuration {
                reason: format!(
                    "option {}: expected option of {} type, saw {}",
                    self.name, kind, self.kind
                ),
            })
        }
    }

    /// Check that a value may be assigned to this option.
    ///
    /// Returns the value to store, widening an integer into a double option.
    fn accept(&self, value: OptionValue) -> CoreResult<OptionValue> {
        match (self.kind, value) {
            (OptionKind::Double, OptionValue::Integer(i)) => Ok(OptionValue::Double(i as f64)),
            (OptionKind::Map, OptionValue::Map(map)) => {
                if let Some((key, _)) = map.iter().find(|(_, v)| !v.is_scalar()) {
                    return Err(CoreError::Configuration {
                        reason: format!("option {}: map entry {} is not a scalar", self.name, key),
                    });
                }
                Ok(OptionValue::Map(map))
            }
            (kind, value) if value.kind() == kind => Ok(value),
            (kind, value) => Err(CoreError::Configuration {
                reason: format!("option {}: expected {}, saw {}", self.name, kind, value),
            }),
        }
    }
}

/// Named set of option assignments plus free arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    name: String,
    values: IndexMap<String, OptionValue>,
    free_args: Vec<String>,
}

impl Section {
    /// Create an empty section
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: IndexMap::new(),
            free_args: Vec::new(),
        }
    }

    /// Create the anonymous section
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_SECTION)
    }

    /// Section name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Is this the anonymous section
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.name == ANONYMOUS_SECTION
    }

    /// Value assigned to the option, if any
    #[must_use]
    pub fn value(&self, option: &OptionSpec) -> Option<&OptionValue> {
        self.values.get(&option.name)
    }

    /// Value assigned to the option, or its default
    #[must_use]
    pub fn value_or_default<'a>(&'a self, option: &'a OptionSpec) -> Option<&'a OptionValue> {
        self.value(option).or(option.default.as_ref())
    }

    /// Whether a boolean option is on.
    ///
    /// True iff the assigned value is true, or nothing is assigned and the
    /// default is true.
    ///
    /// # Errors
    ///
    /// Returns error if the option is not boolean
    pub fn is_true(&self, option: &OptionSpec) -> CoreResult<bool> {
        option.expect_kind(OptionKind::Boolean)?;
        Ok(matches!(
            self.value_or_default(option),
            Some(OptionValue::Boolean(true))
        ))
    }

    /// Integer value of an option, falling back to its default
    ///
    /// # Errors
    ///
    /// Returns error if the option is not an integer option
    pub fn integer(&self, option: &OptionSpec) -> CoreResult<Option<i64>> {
        option.expect_kind(OptionKind::Integer)?;
        Ok(match self.value_or_default(option) {
            Some(OptionValue::Integer(i)) => Some(*i),
            _ => None,
        })
    }

    /// String value of an option, falling back to its default
    ///
    /// # Errors
    ///
    /// Returns error if the option is not a string option
    pub fn string<'a>(&'a self, option: &'a OptionSpec) -> CoreResult<Option<&'a str>> {
        option.expect_kind(OptionKind::String)?;
        Ok(match self.value_or_default(option) {
            Some(OptionValue::String(s)) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Map assigned to a map option
    ///
    /// # Errors
    ///
    /// Returns error if the option is not a map option
    pub fn map_value(&self, option: &OptionSpec) -> CoreResult<Option<&IndexMap<String, OptionValue>>> {
        option.expect_kind(OptionKind::Map)?;
        Ok(match self.values.get(&option.name) {
            Some(OptionValue::Map(map)) => Some(map),
            _ => None,
        })
    }

    /// Entry of a map option
    ///
    /// # Errors
    ///
    /// Returns error if the option is not a map option
    pub fn map_entry(&self, option: &OptionSpec, key: &str) -> CoreResult<Option<&OptionValue>> {
        Ok(self.map_value(option)?.and_then(|map| map.get(key)))
    }

    /// Assign a scalar value; `None` removes the assignment.
    ///
    /// Returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns error if the option has map type or the value has the wrong type
    pub fn set_scalar(
        &mut self,
        option: &OptionSpec,
        value: Option<OptionValue>,
    ) -> CoreResult<Option<OptionValue>> {
        let Some(value) = value else {
            return Ok(self.values.shift_remove(&option.name));
        };
        if option.kind == OptionKind::Map || !value.is_scalar() {
            return Err(CoreError::Configuration {
                reason: format!("option {}: expected scalar value, saw map", option.name),
            });
        }
        let value = option.accept(value)?;
        Ok(self.values.insert(option.name.clone(), value))
    }

    /// Assign a whole map; `None` removes the assignment.
    ///
    /// # Errors
    ///
    /// Returns error if the option is not a map option or an entry is not scalar
    pub fn set_map(
        &mut self,
        option: &OptionSpec,
        value: Option<IndexMap<String, OptionValue>>,
    ) -> CoreResult<Option<IndexMap<String, OptionValue>>> {
        option.expect_kind(OptionKind::Map)?;
        let previous = match value {
            None => self.values.shift_remove(&option.name),
            Some(map) => {
                let map = option.accept(OptionValue::Map(map))?;
                self.values.insert(option.name.clone(), map)
            }
        };
        Ok(match previous {
            Some(OptionValue::Map(map)) => Some(map),
            _ => None,
        })
    }

    /// Add, replace or remove (`None`) one entry of a map option.
    ///
    /// Creates an empty map for the option if it has none.
    ///
    /// # Errors
    ///
    /// Returns error if the option is not a map option or the value is a map
    pub fn put_map_entry(
        &mut self,
        option: &OptionSpec,
        key: impl Into<String>,
        value: Option<OptionValue>,
    ) -> CoreResult<Option<OptionValue>> {
        option.expect_kind(OptionKind::Map)?;
        let key = key.into();
        if value.as_ref().is_some_and(|v| !v.is_scalar()) {
            return Err(CoreError::Configuration {
                reason: format!("option {}: map entry {} is not a scalar", option.name, key),
            });
        }
        let slot = self
            .values
            .entry(option.name.clone())
            .or_insert_with(|| OptionValue::Map(IndexMap::new()));
        let OptionValue::Map(map) = slot else {
            return Err(CoreError::Configuration {
                reason: format!("option {}: stored value is not a map", option.name),
            });
        };
        Ok(match value {
            Some(value) => map.insert(key, value),
            None => map.shift_remove(&key),
        })
    }

    /// Append a free argument
    pub fn add_free_arg(&mut self, arg: impl Into<String>) {
        self.free_args.push(arg.into());
    }

    /// Free arguments in order
    #[must_use]
    pub fn free_args(&self) -> &[String] {
        &self.free_args
    }

    /// The i-th free argument
    #[must_use]
    pub fn free_arg(&self, index: usize) -> Option<&str> {
        self.free_args.get(index).map(String::as_str)
    }

    /// Option names that have a value, in assignment order
    pub fn assigned(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite assignments with those of another section.
    ///
    /// Map options are merged entry by entry. Free arguments are not copied.
    pub fn read(&mut self, other: &Section) {
        for (name, value) in &other.values {
            match (self.values.get_mut(name), value) {
                (Some(OptionValue::Map(mine)), OptionValue::Map(theirs)) => {
                    for (key, entry) in theirs {
                        mine.insert(key.clone(), entry.clone());
                    }
                }
                _ => {
                    self.values.insert(name.clone(), value.clone());
                }
            }
        }
    }

    /// Render in command-line-like form, one assignment per line.
    ///
    /// Named sections start with `--name`; map entries render as
    /// `-optionKEY=value`; free arguments come last.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.is_anonymous() {
            lines.push(format!("--{}", self.name));
        }
        for (name, value) in &self.values {
            match value {
                OptionValue::Map(map) => {
                    for (key, entry) in map {
                        lines.push(format!("-{}{}={}", name, key, entry));
                    }
                }
                scalar => lines.push(format!("-{}={}", name, scalar)),
            }
        }
        lines.extend(self.free_args.iter().cloned());
        lines
    }
}

/// Declared options plus the sections that assign them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    options: IndexMap<String, OptionSpec>,
    anonymous: Section,
    sections: IndexMap<String, Section>,
}

impl Configuration {
    /// Create a configuration over a set of options
    ///
    /// # Errors
    ///
    /// Returns error on duplicate option names or an ill-typed default
    pub fn new(options: impl IntoIterator<Item = OptionSpec>) -> CoreResult<Self> {
        let mut map = IndexMap::new();
        for option in options {
            if let Some(default) = &option.default {
                option.accept(default.clone())?;
            }
            if map.contains_key(&option.name) {
                return Err(CoreError::AlreadyExists {
                    kind: "Option".to_string(),
                    id: option.name,
                });
            }
            map.insert(option.name.clone(), option);
        }
        Ok(Self {
            options: map,
            anonymous: Section::anonymous(),
            sections: IndexMap::new(),
        })
    }

    /// Declared options
    pub fn options(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.values()
    }

    /// Look up an option by name
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.get(name)
    }

    /// The anonymous section
    #[must_use]
    pub fn anonymous(&self) -> &Section {
        &self.anonymous
    }

    /// The anonymous section, mutably
    pub fn anonymous_mut(&mut self) -> &mut Section {
        &mut self.anonymous
    }

    /// Replace the anonymous section
    ///
    /// # Errors
    ///
    /// Returns error if the section assigns an undeclared or ill-typed option
    pub fn set_anonymous(&mut self, mut section: Section) -> CoreResult<()> {
        self.validate_section(&section)?;
        section.name = ANONYMOUS_SECTION.to_string();
        self.anonymous = section;
        Ok(())
    }

    /// Section by name; the reserved name returns the anonymous section
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        if name == ANONYMOUS_SECTION {
            return Some(&self.anonymous);
        }
        self.sections.get(name)
    }

    /// Section by name, mutably
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        if name == ANONYMOUS_SECTION {
            return Some(&mut self.anonymous);
        }
        self.sections.get_mut(name)
    }

    /// Add or replace a named section
    ///
    /// # Errors
    ///
    /// Returns error if the section uses the reserved name or assigns an
    /// undeclared or ill-typed option
    pub fn add_section(&mut self, section: Section) -> CoreResult<()> {
        if section.is_anonymous() {
            return Err(CoreError::Configuration {
                reason: format!("section name {} is reserved", ANONYMOUS_SECTION),
            });
        }
        self.validate_section(&section)?;
        self.sections.insert(section.name.clone(), section);
        Ok(())
    }

    /// Number of named sections
    #[must_use]
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Named sections in insertion order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// Check that every assignment names a declared option of matching type
    ///
    /// # Errors
    ///
    /// Returns error describing the first offending assignment
    pub fn validate_section(&self, section: &Section) -> CoreResult<()> {
        for (name, value) in &section.values {
            let option = self.options.get(name).ok_or_else(|| CoreError::Configuration {
                reason: format!(
                    "option {} is not associated to this configuration (section {})",
                    name, section.name
                ),
            })?;
            option.accept(value.clone())?;
        }
        Ok(())
    }

    /// Validate every section, e.g. after deserializing a dump
    ///
    /// # Errors
    ///
    /// Returns error describing the first offending assignment, a named
    /// section stored under another key or under the reserved name, or an
    /// anonymous section with a name of its own
    pub fn validate(&self) -> CoreResult<()> {
        if !self.anonymous.is_anonymous() {
            return Err(CoreError::Configuration {
                reason: format!(
                    "anonymous section is named {}, expected {}",
                    self.anonymous.name, ANONYMOUS_SECTION
                ),
            });
        }
        self.validate_section(&self.anonymous)?;
        for (key, section) in &self.sections {
            if section.is_anonymous() || key == ANONYMOUS_SECTION {
                return Err(CoreError::Configuration {
                    reason: format!("section name {} is reserved", ANONYMOUS_SECTION),
                });
            }
            if *key != section.name {
                return Err(CoreError::Configuration {
                    reason: format!("section {} is stored under key {}", section.name, key),
                });
            }
            self.validate_section(section)?;
        }
        Ok(())
    }

    /// Take over the sections of another configuration.
    ///
    /// The anonymous section is replaced; named sections present in both are
    /// merged with [`Section::read`], the others are copied.
    ///
    /// # Errors
    ///
    /// Returns error if the other configuration assigns options undeclared here
    pub fn read(&mut self, other: &Configuration) -> CoreResult<()> {
        other.validate_with(self)?;
        self.anonymous = other.anonymous.clone();
        for section in other.sections.values() {
            match self.sections.get_mut(&section.name) {
                Some(mine) => mine.read(section),
                None => {
                    self.sections.insert(section.name.clone(), section.clone());
                }
            }
        }
        Ok(())
    }

    fn validate_with(&self, target: &Configuration) -> CoreResult<()> {
        target.validate_section(&self.anonymous)?;
        for section in self.sections.values() {
            target.validate_section(section)?;
        }
        Ok(())
    }

    /// Render the anonymous section, then every named section
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        let mut lines = self.anonymous.render();
        for section in self.sections.values() {
            lines.extend(section.render());
        }
        lines
    }
}

/// Options every search session understands
pub mod standard {
    use super::{OptionKind, OptionSpec};

    /// Default number of reports before a search is truncated
    pub const DEFAULT_ERROR_BOUND: i64 = 5;

    /// Number of reported errors after which the search stops
    #[must_use]
    pub fn error_bound() -> OptionSpec {
        OptionSpec::new("errorBound", OptionKind::Integer)
            .with_default(DEFAULT_ERROR_BOUND)
            .with_description("stop the search after this many reported errors")
    }

    /// Session name used to form log and trace file names
    #[must_use]
    pub fn session() -> OptionSpec {
        OptionSpec::new("session", OptionKind::String)
            .with_default("sieve")
            .with_description("root of the names of all files written by the log")
    }

    /// Directory receiving the log and trace files
    #[must_use]
    pub fn directory() -> OptionSpec {
        OptionSpec::new("directory", OptionKind::String)
            .with_default("SIEVE_OUTPUT")
            .with_description("directory in which the log and traces are stored")
    }

    /// Print every state during replay, not only the first and last
    #[must_use]
    pub fn show_states() -> OptionSpec {
        OptionSpec::new("showStates", OptionKind::Boolean)
            .with_default(true)
            .with_description("print the states at each replay step")
    }

    /// All standard options
    #[must_use]
    pub fn all() -> Vec<OptionSpec> {
        vec![error_bound(), session(), directory(), show_states()]
    }
}
