//! The three kinds of local mutation `apply_local_mutation` accepts,
//! per §6 "Ingress to the core": skill update, episode add, identity change.

use serde::{Deserialize, Serialize};
use synapse_crdt::{EpisodeRecord, Identity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LocalMutation {
    UpdateSkill { name: String, proficiency: f64, last_used_ms: u64 },
    RecordSkillUse { name: String },
    AddEpisode(EpisodeRecord),
    ForgetEpisode { id: String },
    SetIdentity(Identity),
}
