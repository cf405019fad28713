//! Agent state composite (C3): the skill accumulator, episode memory, and
//! identity register built on top of the C1/C2 primitives.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use synapse_core::{AgentId, SynapseError, SynapseResult};

use crate::clock::VectorClock;
use crate::primitives::{GSet, LwwRegister, OrSet};

/// One skill's accumulated proficiency and usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Normalized proficiency in `[0, 1]`.
    pub proficiency: f64,
    /// Times this skill has been exercised.
    pub usage_count: u64,
    /// Monotonic milliseconds of last use.
    pub last_used_ms: u64,
}

/// One episodic memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: String,
    pub content: String,
    pub context: String,
    pub outcome: String,
    pub timestamp_ms: u64,
    /// Normalized importance in `[0, 1]`.
    pub importance: f64,
    pub tags: GSet<String>,
}

/// Small identity struct: display name, designation, and values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub display_name: String,
    pub designation: String,
    pub values: Vec<String>,
}

/// The full replicated state for one logical agent.
///
/// `agent_id` and `created_at` are immutable after [`AgentState::create`] —
/// both are part of the agent's [`AgentState::fingerprint`] and merging two
/// states with different `agent_id`s is rejected outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    agent_id: AgentId,
    created_at: DateTime<Utc>,
    replica_id: String,
    skills: BTreeMap<String, LwwRegister<SkillRecord>>,
    episodes: OrSet<EpisodeRecord>,
    identity: LwwRegister<Identity>,
    vector_clock: VectorClock,
}

impl AgentState {
    /// Create a fresh agent state owned by `replica_id`, with an empty
    /// identity and no skills or episodes yet.
    pub fn create(agent_id: AgentId, replica_id: impl Into<String>) -> SynapseResult<Self> {
        let replica_id = replica_id.into();
        let created_at = Utc::now();
        let mut vector_clock = VectorClock::zero();
        vector_clock.increment(&replica_id)?;

        Ok(Self {
            agent_id,
            created_at,
            identity: LwwRegister::new(
                Identity {
                    display_name: String::new(),
                    designation: String::new(),
                    values: Vec::new(),
                },
                created_at,
                replica_id.clone(),
            ),
            skills: BTreeMap::new(),
            episodes: OrSet::empty(),
            vector_clock,
            replica_id,
        })
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn vector_clock(&self) -> &VectorClock {
        &self.vector_clock
    }

    pub fn skill(&self, name: &str) -> Option<&SkillRecord> {
        self.skills.get(name).map(LwwRegister::get)
    }

    pub fn identity(&self) -> &Identity {
        self.identity.get()
    }

    pub fn episodes(&self) -> Vec<&EpisodeRecord> {
        self.episodes.value()
    }

    /// Set or overwrite a skill's proficiency and last-use time, bumping
    /// its usage count by one.
    pub fn update_skill(&mut self, name: &str, proficiency: f64, last_used_ms: u64) -> SynapseResult<()> {
        let usage_count = self.skills.get(name).map(|r| r.get().usage_count).unwrap_or(0) + 1;
        let record = SkillRecord {
            proficiency: proficiency.clamp(0.0, 1.0),
            usage_count,
            last_used_ms,
        };
        let now = Utc::now();
        match self.skills.get_mut(name) {
            Some(reg) => reg.set(record, now, self.replica_id.clone()),
            None => {
                self.skills
                    .insert(name.to_string(), LwwRegister::new(record, now, self.replica_id.clone()));
            }
        }
        self.vector_clock.increment(&self.replica_id)
    }

    /// Record a use of an existing skill without changing its proficiency.
    pub fn record_skill_use(&mut self, name: &str) -> SynapseResult<()> {
        let current = self
            .skills
            .get(name)
            .map(|r| r.get().clone())
            .ok_or_else(|| SynapseError::InvariantViolation(format!("unknown skill {name}")))?;
        let record = SkillRecord {
            proficiency: current.proficiency,
            usage_count: current.usage_count + 1,
            last_used_ms: current.last_used_ms,
        };
        let now = Utc::now();
        self.skills
            .get_mut(name)
            .expect("checked above")
            .set(record, now, self.replica_id.clone());
        self.vector_clock.increment(&self.replica_id)
    }

    /// Add an episodic memory.
    pub fn add_episode(&mut self, record: EpisodeRecord) -> SynapseResult<()> {
        self.episodes.add(record, &self.replica_id);
        self.vector_clock.increment(&self.replica_id)
    }

    /// Tombstone an episodic memory by id.
    pub fn forget_episode(&mut self, id: &str) -> SynapseResult<()> {
        let target = self.episodes.value().iter().find(|e| e.id == id).map(|e| (*e).clone());
        if let Some(record) = target {
            self.episodes.remove(&record);
        }
        self.vector_clock.increment(&self.replica_id)
    }

    /// Overwrite the identity register.
    pub fn set_identity(&mut self, identity: Identity) -> SynapseResult<()> {
        self.identity.set(identity, Utc::now(), self.replica_id.clone());
        self.vector_clock.increment(&self.replica_id)
    }

    /// Merge `other`'s state into `self`, pointwise on every sub-CRDT and
    /// the vector clock. Rejects merging states for different agents.
    pub fn merge(&mut self, other: &Self) -> SynapseResult<()> {
        if self.agent_id != other.agent_id {
            return Err(SynapseError::InvariantViolation(format!(
                "cannot merge agent state for {} into {}",
                other.agent_id, self.agent_id
            )));
        }

        for (name, other_reg) in &other.skills {
            match self.skills.get_mut(name) {
                Some(local_reg) => {
                    let merged_proficiency = local_reg.get().proficiency.max(other_reg.get().proficiency);
                    local_reg.merge(other_reg);
                    let mut winner = local_reg.get().clone();
                    winner.proficiency = merged_proficiency;
                    *local_reg = LwwRegister::new(winner, local_reg.timestamp(), local_reg.replica_id().to_string());
                }
                None => {
                    self.skills.insert(name.clone(), other_reg.clone());
                }
            }
        }

        self.episodes.merge(&other.episodes);
        self.identity.merge(&other.identity);
        self.vector_clock = self.vector_clock.merge(&other.vector_clock);
        Ok(())
    }

    /// The agent's fingerprint: `hex(sha384("{agent_id}:{name}:{created_at}"))`
    /// over the fixed triple, per invariant (iii).
    pub fn fingerprint(&self) -> String {
        synapse_crypto::fingerprint(
            &self.agent_id.0,
            &self.identity.get().display_name,
            &self.created_at.to_rfc3339(),
        )
    }
}
