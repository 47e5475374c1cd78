//! Entity type definitions

pub mod config;
pub mod history;
pub mod package;
pub mod sheet;

pub use config::{ConfigLookup, ConfigPatch, CustomCutDef, ProcessorCutConfig, TemplateRef};
pub use history::{
    ChangeCategory, ChangeType, HistoryEntry, HistorySummary, NewHistoryEntry,
};
pub use package::{NewPackage, ProducedPackage};
pub use sheet::{
    AddCutRequest, AddedCut, BaconPreference, BeefOptions, CutParamUpdates, CutSheet,
    CutSheetItem, CutSheetSausage, CutSheetState, GroundType, HamPreference,
    ModificationRecord, NewCutSheet, OrganFlags, PattySize, PorkOptions, RemovedCut,
    SheetStatus, ShoulderPreference,
};
