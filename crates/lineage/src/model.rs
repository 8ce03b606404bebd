//! Coaching lineage data model
//!
//! Entities and value types shared by the graph store, inference, scoring
//! and projection. Persisted shapes derive `Validate` so malformed records
//! can be rejected once at load time.

use coachtree_common::errors::AppError;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use validator::{Validate, ValidationError};

/// Stable coach identifier, a slug derived from the display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoachId(String);

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"))
}

impl CoachId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier from a display name: "Bill Walsh" -> "bill-walsh"
    pub fn from_name(name: &str) -> Self {
        let lowered = name.to_lowercase();
        let slug = slug_pattern().replace_all(&lowered, "-");
        Self(slug.trim_matches('-').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for CoachId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CoachId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CoachId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Sport a coach belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Football,
    Basketball,
    Baseball,
    Hockey,
    Soccer,
}

impl Sport {
    pub fn all() -> [Sport; 5] {
        [
            Sport::Football,
            Sport::Basketball,
            Sport::Baseball,
            Sport::Hockey,
            Sport::Soccer,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Football => "football",
            Sport::Basketball => "basketball",
            Sport::Baseball => "baseball",
            Sport::Hockey => "hockey",
            Sport::Soccer => "soccer",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Sport::all()
            .into_iter()
            .find(|sport| sport.as_str() == lowered)
            .ok_or_else(|| AppError::UnknownSport { value: s.to_string() })
    }
}

/// Year interval with an optional open end ("ongoing")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_year_span"))]
pub struct YearSpan {
    pub start: i32,
    #[serde(default)]
    pub end: Option<i32>,
}

fn validate_year_span(span: &YearSpan) -> Result<(), ValidationError> {
    match span.end {
        Some(end) if end < span.start => {
            let mut err = ValidationError::new("year_order");
            err.message = Some(format!("ends in {} before starting in {}", end, span.start).into());
            Err(err)
        }
        _ => Ok(()),
    }
}

impl YearSpan {
    pub fn new(start: i32, end: Option<i32>) -> Self {
        Self { start, end }
    }

    pub fn closed(start: i32, end: i32) -> Self {
        Self { start, end: Some(end) }
    }

    pub fn open(start: i32) -> Self {
        Self { start, end: None }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// End year, with an open end resolved to the evaluation year
    pub fn resolved_end(&self, current_year: i32) -> i32 {
        self.end.unwrap_or(current_year)
    }

    /// Elapsed years between start and the resolved end, never negative
    pub fn years(&self, current_year: i32) -> i32 {
        (self.resolved_end(current_year) - self.start).max(0)
    }

    /// Intersection of two spans, `None` when they do not touch
    pub fn overlap(&self, other: &YearSpan, current_year: i32) -> Option<ClosedSpan> {
        let start = self.start.max(other.start);
        let end = self
            .resolved_end(current_year)
            .min(other.resolved_end(current_year));

        (start <= end).then_some(ClosedSpan { start, end })
    }
}

impl fmt::Display for YearSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-present", self.start),
        }
    }
}

/// Year interval with both ends resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClosedSpan {
    pub start: i32,
    pub end: i32,
}

/// Normalized tenure role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    HeadCoach,
    Coordinator,
    Assistant,
    PositionCoach,
    Player,
    Other,
}

impl Role {
    /// Normalize a free-text role label
    pub fn normalize(label: &str) -> Role {
        let label = label.to_lowercase();

        if label.contains("assistant") {
            Role::Assistant
        } else if label.contains("coordinator") {
            Role::Coordinator
        } else if label.contains("head coach")
            || (label.contains("manager") && !label.contains("general manager"))
        {
            Role::HeadCoach
        } else if label.contains("player") {
            Role::Player
        } else if label.contains("coach") {
            Role::PositionCoach
        } else {
            Role::Other
        }
    }
}

/// Win/loss/tie record for one tenure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
}

/// One stint at one organization in one role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Tenure {
    #[validate(length(min = 1))]
    pub organization: String,

    #[validate(nested)]
    pub years: YearSpan,

    /// Role label as recorded by the source
    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
}

impl Tenure {
    pub fn new(organization: impl Into<String>, years: YearSpan, role: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            years,
            role: role.into(),
            record: None,
        }
    }

    pub fn normalized_role(&self) -> Role {
        Role::normalize(&self.role)
    }

    pub fn is_head_coach(&self) -> bool {
        self.normalized_role() == Role::HeadCoach
    }
}

/// Achievement counters feeding direct success
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Achievements {
    pub championships: u32,
    pub coach_of_year_awards: u32,
    pub playoff_appearances: u32,
    #[validate(range(min = 0.0, max = 1.0))]
    pub win_percentage: f64,
    pub all_star_selections: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub major_trophies: Option<u32>,
}

/// Graph node: one individual's career
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coach {
    #[validate(custom(function = "validate_coach_id"))]
    pub id: CoachId,

    #[validate(length(min = 1))]
    pub name: String,

    pub sport: Sport,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_team: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub tenures: Vec<Tenure>,

    #[validate(nested)]
    pub active_years: YearSpan,

    #[serde(default)]
    #[validate(nested)]
    pub achievements: Achievements,
}

fn validate_coach_id(id: &CoachId) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::new("empty_id"));
    }
    Ok(())
}

impl Coach {
    /// Build a coach whose id is derived from the name
    pub fn new(name: impl Into<String>, sport: Sport, active_years: YearSpan) -> Self {
        let name = name.into();
        Self {
            id: CoachId::from_name(&name),
            name,
            sport,
            current_team: None,
            tenures: Vec::new(),
            active_years,
            achievements: Achievements::default(),
        }
    }

    pub fn with_tenure(mut self, tenure: Tenure) -> Self {
        self.tenures.push(tenure);
        self
    }

    pub fn with_current_team(mut self, team: impl Into<String>) -> Self {
        self.current_team = Some(team.into());
        self
    }

    pub fn with_achievements(mut self, achievements: Achievements) -> Self {
        self.achievements = achievements;
        self
    }

    pub fn has_head_coach_tenure(&self) -> bool {
        self.tenures.iter().any(Tenure::is_head_coach)
    }

    /// Years spent in head-coach tenures, summed across tenures
    pub fn head_coach_years(&self, current_year: i32) -> i32 {
        self.tenures
            .iter()
            .filter(|t| t.is_head_coach())
            .map(|t| t.years.years(current_year))
            .sum()
    }

    pub fn years_active(&self, current_year: i32) -> i32 {
        self.active_years.years(current_year)
    }

    pub fn is_active(&self) -> bool {
        self.active_years.is_open()
    }

    /// Tenure with the latest resolved end, later start breaking ties
    pub fn most_recent_tenure(&self) -> Option<&Tenure> {
        self.tenures
            .iter()
            .max_by_key(|t| (t.years.end.unwrap_or(i32::MAX), t.years.start))
    }

    /// Single label for display: current head-coach post, else latest role
    pub fn display_role(&self) -> String {
        if let Some(team) = &self.current_team {
            return format!("Head Coach, {}", team);
        }
        self.most_recent_tenure()
            .map(|t| t.role.clone())
            .unwrap_or_else(|| "Coach".to_string())
    }
}

/// Disciple's position during the overlap an edge was inferred from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipRole {
    Assistant,
    Coordinator,
}

impl RelationshipRole {
    /// "coordinator" when the label says so, otherwise "assistant"
    pub fn classify(label: &str) -> Self {
        if label.to_lowercase().contains("coordinator") {
            RelationshipRole::Coordinator
        } else {
            RelationshipRole::Assistant
        }
    }
}

/// Directed mentor -> disciple edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub mentor_id: CoachId,
    pub disciple_id: CoachId,
    pub organization: String,
    pub years: ClosedSpan,
    pub role: RelationshipRole,
}

/// Persisted coach shape with mirrored adjacency lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CoachRecord {
    #[serde(flatten)]
    #[validate(nested)]
    pub coach: Coach,

    #[serde(default)]
    pub mentors: Vec<RelationshipEdge>,

    #[serde(default)]
    pub disciples: Vec<RelationshipEdge>,
}

impl From<Coach> for CoachRecord {
    fn from(coach: Coach) -> Self {
        Self {
            coach,
            mentors: Vec::new(),
            disciples: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_name() {
        assert_eq!(CoachId::from_name("Bill Walsh").as_str(), "bill-walsh");
        assert_eq!(CoachId::from_name("  Mike O'Brien Jr. ").as_str(), "mike-o-brien-jr");
    }

    #[test]
    fn test_sport_parse() {
        assert_eq!("Football".parse::<Sport>().unwrap(), Sport::Football);
        assert!("curling".parse::<Sport>().is_err());
    }

    #[test]
    fn test_role_normalization() {
        assert_eq!(Role::normalize("Head Coach"), Role::HeadCoach);
        assert_eq!(Role::normalize("Manager"), Role::HeadCoach);
        assert_eq!(Role::normalize("General Manager"), Role::Other);
        assert_eq!(Role::normalize("Assistant Head Coach"), Role::Assistant);
        assert_eq!(Role::normalize("Defensive Coordinator"), Role::Coordinator);
        assert_eq!(Role::normalize("Quarterbacks Coach"), Role::PositionCoach);
        assert_eq!(Role::normalize("Player"), Role::Player);
        assert_eq!(Role::normalize("Scout"), Role::Other);
    }

    #[test]
    fn test_relationship_role_fallback() {
        assert_eq!(RelationshipRole::classify("Offensive Coordinator"), RelationshipRole::Coordinator);
        assert_eq!(RelationshipRole::classify("Linebackers Coach"), RelationshipRole::Assistant);
        assert_eq!(RelationshipRole::classify("Player"), RelationshipRole::Assistant);
    }

    #[test]
    fn test_overlap_resolves_open_end() {
        let a = YearSpan::open(2010);
        let b = YearSpan::closed(2005, 2012);
        assert_eq!(a.overlap(&b, 2024), Some(ClosedSpan { start: 2010, end: 2012 }));

        let c = YearSpan::closed(1990, 1995);
        assert_eq!(a.overlap(&c, 2024), None);

        // Single shared year still overlaps
        let d = YearSpan::closed(2012, 2015);
        assert_eq!(b.overlap(&d, 2024), Some(ClosedSpan { start: 2012, end: 2012 }));
    }

    #[test]
    fn test_year_span_display_and_years() {
        assert_eq!(YearSpan::open(2001).to_string(), "2001-present");
        assert_eq!(YearSpan::closed(1990, 2015).to_string(), "1990-2015");
        assert_eq!(YearSpan::open(2020).years(2024), 4);
        assert_eq!(YearSpan::open(2030).years(2024), 0);
    }

    #[test]
    fn test_display_role() {
        let coach = Coach::new("Andy Reid", Sport::Football, YearSpan::open(1992))
            .with_tenure(Tenure::new("Packers", YearSpan::closed(1992, 1998), "Assistant"))
            .with_tenure(Tenure::new("Eagles", YearSpan::closed(1999, 2012), "Head Coach"));
        assert_eq!(coach.display_role(), "Head Coach");

        let coach = coach.with_current_team("Chiefs");
        assert_eq!(coach.display_role(), "Head Coach, Chiefs");

        let bare = Coach::new("Nobody", Sport::Hockey, YearSpan::open(2020));
        assert_eq!(bare.display_role(), "Coach");
    }

    #[test]
    fn test_head_coach_years() {
        let coach = Coach::new("Phil Jackson", Sport::Basketball, YearSpan::closed(1987, 2011))
            .with_tenure(Tenure::new("Bulls", YearSpan::closed(1987, 1989), "Assistant Coach"))
            .with_tenure(Tenure::new("Bulls", YearSpan::closed(1989, 1998), "Head Coach"))
            .with_tenure(Tenure::new("Lakers", YearSpan::closed(1999, 2011), "Head Coach"));
        assert_eq!(coach.head_coach_years(2024), 9 + 12);
        assert_eq!(coach.years_active(2024), 24);
        assert!(!coach.is_active());
    }

    #[test]
    fn test_validation_rejects_inverted_tenure() {
        let coach = Coach::new("Backwards", Sport::Soccer, YearSpan::open(2000))
            .with_tenure(Tenure::new("United", YearSpan::closed(2010, 2005), "Manager"));
        assert!(coach.validate().is_err());

        let ok = Coach::new("Forwards", Sport::Soccer, YearSpan::open(2000))
            .with_tenure(Tenure::new("United", YearSpan::closed(2005, 2010), "Manager"));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_name_and_bad_win_pct() {
        let mut coach = Coach::new("Someone", Sport::Baseball, YearSpan::open(2000));
        coach.name.clear();
        assert!(coach.validate().is_err());

        let mut coach = Coach::new("Someone", Sport::Baseball, YearSpan::open(2000));
        coach.achievements.win_percentage = 1.5;
        assert!(coach.validate().is_err());
    }

    #[test]
    fn test_record_flattens_coach_fields() {
        let record = CoachRecord::from(Coach::new("Bill Walsh", Sport::Football, YearSpan::closed(1979, 1988)));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "bill-walsh");
        assert_eq!(json["sport"], "football");
        assert!(json["mentors"].as_array().unwrap().is_empty());

        let back: CoachRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
