//! OpenSR Pipeline
//!
//! The match/action rule model for the three-stage forwarding pipeline,
//! the synthesizer that derives concrete rules from segment/subnet
//! state, and the idempotent rule store facade.
//!
//! ## Pipeline stages
//!
//! ```text
//! ┌────────────────────┐   ┌─────────────────────┐   ┌──────────────────┐
//! │ 0: CLASSIFIER       │   │ 1: SEGMENT          │   │ 2: HOST          │
//! │ tag == own segment  │──▶│ tag == segment N    │   │ dst == host ip   │
//! │   pop, goto 2       │   │   output tree port  │   │   output port    │
//! │ untagged, local net │   └─────────────────────┘   └──────────────────┘
//! │   goto 2            │
//! │ untagged, remote net│
//! │   push tag, goto 1  │
//! │ tagged (catch-all)  │
//! │   goto 1            │
//! └────────────────────┘
//! ```

pub mod rule;
pub mod store;
pub mod synth;

pub use rule::{
    priority, Action, AppId, FlowRule, Lifetime, RuleKey, Selector, TableId, Treatment, VlanMatch,
};
pub use store::{MemoryRuleStore, RuleStore};
pub use synth::RuleSynthesizer;
