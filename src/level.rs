//! Level schema and catalog
//!
//! A level is an immutable value object: board size, brick blueprints and
//! objective definitions. Levels are validated once when they enter a
//! [`LevelCatalog`], so loading a level into a session can never fail.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::objectives::ObjectiveKind;

/// Reasons a level is rejected at load time
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("level id must be provided")]
    MissingId,

    #[error("level `{level}` has no board")]
    MissingBoard { level: String },

    #[error("level `{level}` board must be at least 1x1 (got {columns}x{rows})")]
    InvalidBoard {
        level: String,
        columns: u32,
        rows: u32,
    },

    #[error("level `{level}` brick at ({column},{row}) is outside the {columns}x{rows} board")]
    BrickOutOfBounds {
        level: String,
        column: u32,
        row: u32,
        columns: u32,
        rows: u32,
    },

    #[error("level `{level}` places two bricks at ({column},{row})")]
    DuplicateBrick { level: String, column: u32, row: u32 },

    #[error("level `{level}` brick at ({column},{row}) has zero hit points")]
    ZeroHitPoints { level: String, column: u32, row: u32 },

    #[error("level `{level}` has an objective without an id")]
    MissingObjectiveId { level: String },

    #[error("level `{level}` objective `{objective}` has no type")]
    MissingObjectiveType { level: String, objective: String },

    #[error("level `{level}` objective `{objective}` has unknown type `{kind}`")]
    UnknownObjectiveType {
        level: String,
        objective: String,
        kind: String,
    },

    #[error("level `{level}` defines objective `{objective}` twice")]
    DuplicateObjective { level: String, objective: String },

    #[error("level `{level}` objective `{objective}` has an invalid time limit")]
    InvalidTimeLimit { level: String, objective: String },

    #[error("duplicate level id `{0}` in catalog")]
    DuplicateLevel(String),

    #[error("level catalog is empty")]
    EmptyCatalog,
}

/// Board dimensions in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub columns: u32,
    pub rows: u32,
}

/// Optional level constraints (exposed for UI, not enforced by the core)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub move_limit: Option<u32>,
    pub time_limit_seconds: Option<f32>,
}

/// One brick placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrickBlueprint {
    pub column: u32,
    pub row: u32,
    #[serde(default = "default_brick_type")]
    pub brick_type: String,
    #[serde(default = "default_hit_points")]
    pub hit_points: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

fn default_brick_type() -> String {
    "basic".to_string()
}

fn default_hit_points() -> u32 {
    1
}

impl BrickBlueprint {
    pub fn new(column: u32, row: u32, brick_type: &str, hit_points: u32) -> Self {
        Self {
            column,
            row,
            brick_type: brick_type.to_string(),
            hit_points,
            tags: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// What an objective counts toward
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Target {
    pub amount: u32,
    pub time_limit_seconds: Option<f32>,
    pub tracked_tags: Vec<String>,
}

/// A declarative level goal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveDefinition {
    pub id: String,
    pub kind: ObjectiveKind,
    pub target: Target,
    pub optional: bool,
    pub tags: Vec<String>,
}

impl ObjectiveDefinition {
    pub fn new(id: &str, kind: ObjectiveKind, amount: u32) -> Self {
        Self {
            id: id.to_string(),
            kind,
            target: Target {
                amount,
                ..Default::default()
            },
            optional: false,
            tags: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn tracking(mut self, tags: &[&str]) -> Self {
        self.target.tracked_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn time_limit(mut self, seconds: f32) -> Self {
        self.target.time_limit_seconds = Some(seconds);
        self
    }
}

/// Complete description of one level
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSchema {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub board: Board,
    pub constraints: Constraints,
    pub bricks: Vec<BrickBlueprint>,
    pub objectives: Vec<ObjectiveDefinition>,
}

impl LevelSchema {
    /// Decode a level from its JSON file form and validate it
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let file: LevelFile = serde_json::from_str(json)?;
        let level = file.into_schema()?;
        level.validate()?;
        Ok(level)
    }

    /// Reject malformed levels rather than building part of them
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.id.is_empty() {
            return Err(LevelError::MissingId);
        }
        let level = || self.id.clone();
        let Board { columns, rows } = self.board;
        if columns == 0 || rows == 0 {
            return Err(LevelError::InvalidBoard {
                level: level(),
                columns,
                rows,
            });
        }

        let mut placed = HashSet::new();
        for brick in &self.bricks {
            let (column, row) = (brick.column, brick.row);
            if column >= columns || row >= rows {
                return Err(LevelError::BrickOutOfBounds {
                    level: level(),
                    column,
                    row,
                    columns,
                    rows,
                });
            }
            if !placed.insert((column, row)) {
                return Err(LevelError::DuplicateBrick {
                    level: level(),
                    column,
                    row,
                });
            }
            if brick.hit_points == 0 {
                return Err(LevelError::ZeroHitPoints {
                    level: level(),
                    column,
                    row,
                });
            }
        }

        let mut ids = HashSet::new();
        for objective in &self.objectives {
            if objective.id.is_empty() {
                return Err(LevelError::MissingObjectiveId { level: level() });
            }
            if !ids.insert(objective.id.as_str()) {
                return Err(LevelError::DuplicateObjective {
                    level: level(),
                    objective: objective.id.clone(),
                });
            }
            if let Some(limit) = objective.target.time_limit_seconds {
                if !limit.is_finite() || limit < 0.0 {
                    return Err(LevelError::InvalidTimeLimit {
                        level: level(),
                        objective: objective.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build a level from digit rows: each digit is a brick's hit points, `0` is empty
    pub fn from_layout(id: &str, display_name: &str, rows: &[&str]) -> Self {
        let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut bricks = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            for (column, ch) in line.chars().enumerate() {
                let hp = ch.to_digit(10).unwrap_or(0);
                if hp == 0 {
                    continue;
                }
                let kind = brick_type_for(hp);
                bricks.push(
                    BrickBlueprint::new(column as u32, row as u32, kind, hp).with_tags(&[kind]),
                );
            }
        }
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            description: String::new(),
            board: Board {
                columns,
                rows: rows.len() as u32,
            },
            constraints: Constraints::default(),
            bricks,
            objectives: Vec::new(),
        }
    }

    pub fn with_objective(mut self, objective: ObjectiveDefinition) -> Self {
        self.objectives.push(objective);
        self
    }

    /// Bricks carrying `tag`
    pub fn count_tagged(&self, tag: &str) -> u32 {
        self.bricks
            .iter()
            .filter(|b| b.tags.iter().any(|t| t == tag))
            .count() as u32
    }
}

fn brick_type_for(hit_points: u32) -> &'static str {
    match hit_points {
        1 => "basic",
        2 => "steel",
        3 => "crystal",
        _ => "fortress",
    }
}

// On-disk form: everything optional so missing fields become load errors
// with a useful message instead of a bare decode failure.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelFile {
    id: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
    board: Option<Board>,
    #[serde(default)]
    constraints: Constraints,
    #[serde(default)]
    bricks: Vec<BrickBlueprint>,
    #[serde(default)]
    objectives: Vec<ObjectiveFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectiveFile {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    target: Target,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    tags: Vec<String>,
}

impl LevelFile {
    fn into_schema(self) -> Result<LevelSchema, LevelError> {
        let id = self.id.filter(|id| !id.is_empty()).ok_or(LevelError::MissingId)?;
        let board = self
            .board
            .ok_or_else(|| LevelError::MissingBoard { level: id.clone() })?;

        let objectives = self
            .objectives
            .into_iter()
            .map(|o| o.into_definition(&id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LevelSchema {
            display_name: self
                .display_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| id.clone()),
            description: self.description.unwrap_or_default(),
            board,
            constraints: self.constraints,
            bricks: self.bricks,
            objectives,
            id,
        })
    }
}

impl ObjectiveFile {
    fn into_definition(self, level: &str) -> Result<ObjectiveDefinition, LevelError> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LevelError::MissingObjectiveId {
                level: level.to_string(),
            })?;
        let raw = self
            .kind
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LevelError::MissingObjectiveType {
                level: level.to_string(),
                objective: id.clone(),
            })?;
        let kind = ObjectiveKind::parse(&raw).ok_or_else(|| LevelError::UnknownObjectiveType {
            level: level.to_string(),
            objective: id.clone(),
            kind: raw.clone(),
        })?;
        Ok(ObjectiveDefinition {
            id,
            kind,
            target: self.target,
            optional: self.optional,
            tags: self.tags,
        })
    }
}

/// Ordered, validated level progression
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<LevelSchema>,
    current: usize,
}

impl LevelCatalog {
    pub fn new(levels: Vec<LevelSchema>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::EmptyCatalog);
        }
        let mut ids = HashSet::new();
        for level in &levels {
            level.validate()?;
            if !ids.insert(level.id.as_str()) {
                return Err(LevelError::DuplicateLevel(level.id.clone()));
            }
        }
        Ok(Self { levels, current: 0 })
    }

    /// The three stock levels
    pub fn builtin() -> Self {
        let training = LevelSchema::from_layout(
            "training-grounds",
            "Training Grounds",
            &["1111111111", "1000000001", "1111111111"],
        )
        .with_objective(ObjectiveDefinition::new("score", ObjectiveKind::Score, 1000));

        let steel = LevelSchema::from_layout(
            "steel-curtain",
            "Steel Curtain",
            &[
                "2222222222",
                "2111111112",
                "2000000002",
                "2111111112",
                "2222222222",
            ],
        );
        let steel_count = steel.count_tagged("steel");
        let steel = steel
            .with_objective(
                ObjectiveDefinition::new("steel", ObjectiveKind::ClearTaggedBricks, steel_count)
                    .tracking(&["steel"]),
            )
            .with_objective(
                ObjectiveDefinition::new("score", ObjectiveKind::Score, 2500).optional(),
            );

        let diamond = LevelSchema::from_layout(
            "diamond-maze",
            "Diamond Maze",
            &[
                "0033333300",
                "0333333330",
                "3332223333",
                "0333333330",
                "0033333300",
            ],
        );
        let core_count = diamond.count_tagged("steel");
        let diamond = diamond
            .with_objective(
                ObjectiveDefinition::new("core", ObjectiveKind::ClearTaggedBricks, core_count)
                    .tracking(&["steel"]),
            )
            .with_objective(
                ObjectiveDefinition::new("crystals", ObjectiveKind::ClearTaggedBricks, 20)
                    .tracking(&["crystal"])
                    .optional(),
            );

        Self {
            levels: vec![training, steel, diamond],
            current: 0,
        }
    }

    pub fn current(&self) -> &LevelSchema {
        &self.levels[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.levels.len()
    }

    /// Move to the next level; returns false at the end of the catalog
    pub fn advance(&mut self) -> bool {
        if self.has_next() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Jump to the level with `id`; unknown ids leave the position unchanged
    pub fn reset_to(&mut self, id: &str) -> bool {
        match self.levels.iter().position(|l| l.id == id) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL_JSON: &str = r#"{
        "id": "test-level",
        "displayName": "Test",
        "board": { "columns": 4, "rows": 2 },
        "constraints": { "moveLimit": 12 },
        "bricks": [
            { "column": 0, "row": 0, "hitPoints": 2, "tags": ["gold"] },
            { "column": 3, "row": 1 }
        ],
        "objectives": [
            { "id": "gold", "type": "clear-tagged-bricks",
              "target": { "amount": 1, "trackedTags": ["gold"] } },
            { "id": "points", "type": "score", "target": { "amount": 100 }, "optional": true }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let level = LevelSchema::from_json(LEVEL_JSON).unwrap();
        assert_eq!(level.id, "test-level");
        assert_eq!(level.board, Board { columns: 4, rows: 2 });
        assert_eq!(level.constraints.move_limit, Some(12));
        assert_eq!(level.bricks.len(), 2);
        assert_eq!(level.bricks[1].brick_type, "basic");
        assert_eq!(level.bricks[1].hit_points, 1);
        assert_eq!(level.objectives[0].kind, ObjectiveKind::ClearTaggedBricks);
        assert!(level.objectives[1].optional);
    }

    #[test]
    fn test_display_name_defaults_to_id() {
        let level =
            LevelSchema::from_json(r#"{ "id": "bare", "board": { "columns": 1, "rows": 1 } }"#)
                .unwrap();
        assert_eq!(level.display_name, "bare");
    }

    #[test]
    fn test_missing_board_rejected() {
        let err = LevelSchema::from_json(r#"{ "id": "x" }"#).unwrap_err();
        assert!(matches!(err, LevelError::MissingBoard { .. }));
    }

    #[test]
    fn test_missing_id_rejected() {
        let err = LevelSchema::from_json(r#"{ "board": { "columns": 1, "rows": 1 } }"#)
            .unwrap_err();
        assert!(matches!(err, LevelError::MissingId));
    }

    #[test]
    fn test_zero_board_rejected() {
        let err = LevelSchema::from_json(r#"{ "id": "x", "board": { "columns": 0, "rows": 3 } }"#)
            .unwrap_err();
        assert!(matches!(err, LevelError::InvalidBoard { columns: 0, rows: 3, .. }));
    }

    #[test]
    fn test_out_of_bounds_brick_rejected() {
        let mut level = LevelSchema::from_layout("x", "X", &["11"]);
        level.bricks.push(BrickBlueprint::new(2, 0, "basic", 1));
        assert!(matches!(
            level.validate(),
            Err(LevelError::BrickOutOfBounds { column: 2, row: 0, .. })
        ));
    }

    #[test]
    fn test_duplicate_brick_rejected() {
        let mut level = LevelSchema::from_layout("x", "X", &["11"]);
        level.bricks.push(BrickBlueprint::new(1, 0, "basic", 3));
        assert!(matches!(
            level.validate(),
            Err(LevelError::DuplicateBrick { column: 1, row: 0, .. })
        ));
    }

    #[test]
    fn test_objective_errors() {
        let missing_type = r#"{ "id": "x", "board": { "columns": 1, "rows": 1 },
            "objectives": [ { "id": "a" } ] }"#;
        assert!(matches!(
            LevelSchema::from_json(missing_type),
            Err(LevelError::MissingObjectiveType { .. })
        ));

        let unknown = r#"{ "id": "x", "board": { "columns": 1, "rows": 1 },
            "objectives": [ { "id": "a", "type": "collect-stars" } ] }"#;
        assert!(matches!(
            LevelSchema::from_json(unknown),
            Err(LevelError::UnknownObjectiveType { .. })
        ));

        let missing_id = r#"{ "id": "x", "board": { "columns": 1, "rows": 1 },
            "objectives": [ { "type": "score" } ] }"#;
        assert!(matches!(
            LevelSchema::from_json(missing_id),
            Err(LevelError::MissingObjectiveId { .. })
        ));
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = LevelCatalog::builtin();
        let levels = catalog.levels.clone();
        assert!(LevelCatalog::new(levels).is_ok());
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.current().display_name, "Training Grounds");
        assert_eq!(catalog.current().bricks.len(), 22);
    }

    #[test]
    fn test_catalog_progression() {
        let mut catalog = LevelCatalog::builtin();
        assert!(catalog.has_next());
        assert!(catalog.advance());
        assert!(catalog.advance());
        assert!(!catalog.has_next());
        assert!(!catalog.advance());
        assert_eq!(catalog.current().id, "diamond-maze");

        assert!(catalog.reset_to("steel-curtain"));
        assert_eq!(catalog.current_index(), 1);
        assert!(!catalog.reset_to("nope"));
        assert_eq!(catalog.current_index(), 1);

        catalog.reset();
        assert_eq!(catalog.current_index(), 0);
    }

    #[test]
    fn test_catalog_rejects_duplicates_and_empty() {
        let a = LevelSchema::from_layout("a", "A", &["1"]);
        assert!(matches!(
            LevelCatalog::new(vec![a.clone(), a]),
            Err(LevelError::DuplicateLevel(_))
        ));
        assert!(matches!(LevelCatalog::new(Vec::new()), Err(LevelError::EmptyCatalog)));
    }
}
