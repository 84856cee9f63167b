//! Communication topologies between federates.
//!
//! Two patterns are supported:
//!
//! - **FanIn**: `S` senders each publish `M` topics to a single `echo`
//!   federate, which re-publishes every topic back to its sender.
//! - **Ring**: `P` federates each publish `M` topics and subscribe to the same
//!   topics of the next `K` federates in circular order.
//!
//! Every builder returns a [`TopologySpec`] whose participants carry their
//! publications and subscriptions in the order the federate programs address
//! them by index.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::log_level::LogLevel;

/// Name of the hub federate in a FanIn topology.
pub const ECHO_NAME: &str = "echo";

const VALUE_TYPE: &str = "string";
const VALUE_UNIT: &str = "#";

/// Communication pattern of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TopologyKind {
    #[default]
    #[serde(alias = "ManyToOne")]
    FanIn,
    #[serde(alias = "Meshed")]
    Ring,
}

impl TopologyKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::FanIn => "FanIn",
            Self::Ring => "Ring",
        }
    }
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("ring topology needs at least one neighbor per participant")]
    NoNeighbors,
    #[error(
        "ring topology with {participants} participants cannot exchange with {neighbors} neighbors each"
    )]
    TooManyNeighbors { participants: usize, neighbors: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    pub key: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub unit: String,
    pub global: bool,
}

impl Publication {
    fn local(key: String) -> Self {
        Self {
            key,
            data_type: VALUE_TYPE.to_string(),
            unit: VALUE_UNIT.to_string(),
            global: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subscription {
    pub key: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub unit: String,
    pub required: bool,
    /// Short name of the received value in FNCS documents. Federates derive
    /// the topic they re-publish from the part before `::`.
    #[serde(skip)]
    pub value_key: String,
}

impl Subscription {
    fn required(key: String, value_key: String) -> Self {
        Self {
            key,
            data_type: VALUE_TYPE.to_string(),
            unit: VALUE_UNIT.to_string(),
            required: true,
            value_key,
        }
    }
}

/// What a federate does with its publications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    /// Publishes freshly generated payloads.
    Publisher,
    /// Re-publishes whatever it received on the matching subscription.
    Echo,
}

impl ParticipantRole {
    /// Numeric flag passed to the federate program (0 = echo, 1 = publisher).
    pub fn flag(self) -> u8 {
        match self {
            Self::Echo => 0,
            Self::Publisher => 1,
        }
    }
}

/// One federate's configuration, serialized as its participant document.
///
/// `role` and `records_timing` only steer the launch command line and are
/// never written to the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantSpec {
    pub name: String,
    pub log_level: u8,
    pub uninterruptible: bool,
    #[serde(rename = "coreType")]
    pub core_type: String,
    #[serde(rename = "coreName")]
    pub core_name: String,
    #[serde(rename = "coreInit")]
    pub core_init: String,
    #[serde(rename = "maxIterations")]
    pub max_iterations: u32,
    pub period: f64,
    #[serde(rename = "timeDelta")]
    pub time_delta: f64,
    pub publications: Vec<Publication>,
    pub subscriptions: Vec<Subscription>,
    #[serde(skip)]
    pub role: ParticipantRole,
    #[serde(skip)]
    pub records_timing: bool,
}

impl ParticipantSpec {
    pub fn publication_keys(&self) -> impl Iterator<Item = &str> {
        self.publications.iter().map(|p| p.key.as_str())
    }

    pub fn subscription_keys(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.iter().map(|s| s.key.as_str())
    }

    /// Keys under which this participant's publications are visible to others.
    pub fn scoped_publication_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.publications.iter().map(move |p| {
            if p.global {
                p.key.clone()
            } else {
                scoped_key(&self.name, &p.key)
            }
        })
    }
}

/// Run parameters shared by every participant of one experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantParams {
    pub log_level: LogLevel,
    pub uninterruptible: bool,
    pub core_type: String,
    pub core_tick: String,
    pub core_timeout: String,
    /// Update interval in seconds; used as both period and time delta.
    pub update_interval: f64,
}

impl Default for ParticipantParams {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            uninterruptible: false,
            core_type: "zmq".to_string(),
            core_tick: "30s".to_string(),
            core_timeout: "30s".to_string(),
            update_interval: 10.0,
        }
    }
}

impl ParticipantParams {
    /// Init flags for the federate's own core; each core hosts exactly one federate.
    pub fn core_init(&self) -> String {
        format!(
            "--federates=1 --tick={} --timeout={}",
            self.core_tick, self.core_timeout
        )
    }

    fn participant(
        &self,
        name: String,
        role: ParticipantRole,
        records_timing: bool,
    ) -> ParticipantSpec {
        ParticipantSpec {
            name,
            log_level: self.log_level.as_int(),
            uninterruptible: self.uninterruptible,
            core_type: self.core_type.clone(),
            core_name: String::new(),
            core_init: self.core_init(),
            max_iterations: 1,
            period: self.update_interval,
            time_delta: self.update_interval,
            publications: Vec::new(),
            subscriptions: Vec::new(),
            role,
            records_timing,
        }
    }
}

/// Every participant of one experiment plus the pattern that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologySpec {
    kind: TopologyKind,
    federates: usize,
    neighbor_count: Option<usize>,
    message_count: usize,
    participants: Vec<ParticipantSpec>,
}

impl TopologySpec {
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// Requested federate count: senders for FanIn, ring size for Ring.
    pub fn federates(&self) -> usize {
        self.federates
    }

    pub fn neighbor_count(&self) -> Option<usize> {
        self.neighbor_count
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn participants(&self) -> &[ParticipantSpec] {
        &self.participants
    }

    pub fn participant(&self, name: &str) -> Option<&ParticipantSpec> {
        self.participants.iter().find(|p| p.name == name)
    }

    /// Participants in the order they are started: echo federates first,
    /// everything else in build order.
    pub fn launch_order(&self) -> impl Iterator<Item = &ParticipantSpec> {
        let echoes = self
            .participants
            .iter()
            .filter(|p| p.role == ParticipantRole::Echo);
        let others = self
            .participants
            .iter()
            .filter(|p| p.role != ParticipantRole::Echo);
        echoes.chain(others)
    }

    /// Subscription keys that no participant publishes.
    pub fn dangling_subscriptions(&self) -> Vec<String> {
        let published: HashSet<String> = self
            .participants
            .iter()
            .flat_map(|p| p.scoped_publication_keys())
            .collect();
        self.participants
            .iter()
            .flat_map(|p| p.subscription_keys())
            .filter(|key| !published.contains(*key))
            .map(str::to_string)
            .collect()
    }
}

pub fn scoped_key(owner: &str, key: &str) -> String {
    format!("{owner}/{key}")
}

pub fn sender_name(index: usize) -> String {
    format!("sender{index}")
}

pub fn sender_topic(index: usize, message: usize) -> String {
    format!("sender{index}_m{message}")
}

pub fn ring_name(index: usize) -> String {
    format!("fed{index}")
}

pub fn ring_topic(message: usize) -> String {
    format!("m{message}")
}

/// FNCS value key of topic `m<message>` received from `owner`: `m<message>::<owner>`.
pub fn ring_value_key(message: usize, owner: &str) -> String {
    format!("{}::{owner}", ring_topic(message))
}

/// Indices of the `neighbor_count` participants following `index` in circular order.
pub fn ring_neighbors(index: usize, participant_count: usize, neighbor_count: usize) -> Vec<usize> {
    if participant_count == 0 {
        return Vec::new();
    }
    (1..=neighbor_count)
        .map(|exchange| (index + exchange) % participant_count)
        .collect()
}

/// Build a star topology of `sender_count` senders around one echo federate.
pub fn build_fan_in(
    sender_count: usize,
    message_count: usize,
    params: &ParticipantParams,
) -> TopologySpec {
    let mut participants = Vec::with_capacity(sender_count + 1);
    let mut echo = params.participant(ECHO_NAME.to_string(), ParticipantRole::Echo, true);

    for index in 0..sender_count {
        let name = sender_name(index);
        let mut sender = params.participant(name.clone(), ParticipantRole::Publisher, false);

        for message in 0..message_count {
            let topic = sender_topic(index, message);
            sender.subscriptions.push(Subscription::required(
                scoped_key(ECHO_NAME, &topic),
                topic.clone(),
            ));
            sender.publications.push(Publication::local(topic.clone()));

            echo.subscriptions.push(Subscription::required(
                scoped_key(&name, &topic),
                topic.clone(),
            ));
            echo.publications.push(Publication::local(topic));
        }

        participants.push(sender);
    }
    participants.push(echo);

    TopologySpec {
        kind: TopologyKind::FanIn,
        federates: sender_count,
        neighbor_count: None,
        message_count,
        participants,
    }
}

/// Build a directed ring where every federate listens to its next
/// `neighbor_count` successors.
pub fn build_ring(
    participant_count: usize,
    neighbor_count: usize,
    message_count: usize,
    params: &ParticipantParams,
) -> Result<TopologySpec, TopologyError> {
    if neighbor_count == 0 {
        return Err(TopologyError::NoNeighbors);
    }
    if neighbor_count >= participant_count {
        return Err(TopologyError::TooManyNeighbors {
            participants: participant_count,
            neighbors: neighbor_count,
        });
    }

    let participants = (0..participant_count)
        .map(|index| {
            let mut participant =
                params.participant(ring_name(index), ParticipantRole::Publisher, index == 0);

            for neighbor in ring_neighbors(index, participant_count, neighbor_count) {
                let neighbor_name = ring_name(neighbor);
                let subscriptions = (0..message_count).map(|message| {
                    Subscription::required(
                        scoped_key(&neighbor_name, &ring_topic(message)),
                        ring_value_key(message, &neighbor_name),
                    )
                });
                participant.subscriptions.extend(subscriptions);
            }
            let topics = (0..message_count).map(ring_topic);
            participant
                .publications
                .extend(topics.map(Publication::local));

            participant
        })
        .collect();

    Ok(TopologySpec {
        kind: TopologyKind::Ring,
        federates: participant_count,
        neighbor_count: Some(neighbor_count),
        message_count,
        participants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unique_keys(spec: &ParticipantSpec) {
        let pubs: HashSet<&str> = spec.publication_keys().collect();
        assert_eq!(
            pubs.len(),
            spec.publications.len(),
            "{} publications",
            spec.name
        );
        let subs: HashSet<&str> = spec.subscription_keys().collect();
        assert_eq!(
            subs.len(),
            spec.subscriptions.len(),
            "{} subscriptions",
            spec.name
        );
    }

    fn subscribed_owners(spec: &ParticipantSpec) -> Vec<String> {
        let mut owners: Vec<String> = Vec::new();
        for key in spec.subscription_keys() {
            let owner = key.split('/').next().unwrap().to_string();
            if !owners.contains(&owner) {
                owners.push(owner);
            }
        }
        owners
    }

    #[test]
    fn ring_rejects_degenerate_neighbor_counts() {
        let params = ParticipantParams::default();
        assert_eq!(
            build_ring(4, 0, 1, &params),
            Err(TopologyError::NoNeighbors)
        );
        assert_eq!(
            build_ring(4, 4, 1, &params),
            Err(TopologyError::TooManyNeighbors {
                participants: 4,
                neighbors: 4
            })
        );
        assert!(build_ring(1, 1, 1, &params).is_err());
    }

    #[test]
    fn ring_wraps_around_to_first_participant() {
        let topology = build_ring(4, 1, 1, &ParticipantParams::default()).unwrap();

        let last = topology.participant("fed3").unwrap();
        assert_eq!(subscribed_owners(last), vec!["fed0"]);
        let second = topology.participant("fed1").unwrap();
        assert_eq!(subscribed_owners(second), vec!["fed2"]);
    }

    #[test]
    fn ring_subscriptions_cover_k_distinct_successors() {
        let params = ParticipantParams::default();
        for participants in 2..7 {
            for neighbors in 1..participants {
                let topology = build_ring(participants, neighbors, 3, &params).unwrap();
                assert_eq!(topology.participants().len(), participants);

                for (index, spec) in topology.participants().iter().enumerate() {
                    assert_eq!(spec.subscriptions.len(), neighbors * 3);
                    assert_eq!(spec.publications.len(), 3);
                    assert_unique_keys(spec);

                    let expected: Vec<String> = (1..=neighbors)
                        .map(|e| ring_name((index + e) % participants))
                        .collect();
                    let owners = subscribed_owners(spec);
                    assert_eq!(owners, expected);
                    assert!(!owners.contains(&spec.name));
                }
                assert!(topology.dangling_subscriptions().is_empty());
            }
        }
    }

    #[test]
    fn ring_keys_are_grouped_by_neighbor_then_message() {
        let topology = build_ring(3, 2, 2, &ParticipantParams::default()).unwrap();
        let keys: Vec<&str> = topology.participants()[2].subscription_keys().collect();
        assert_eq!(keys, vec!["fed0/m0", "fed0/m1", "fed1/m0", "fed1/m1"]);
        let pubs: Vec<&str> = topology.participants()[2].publication_keys().collect();
        assert_eq!(pubs, vec!["m0", "m1"]);
    }

    #[test]
    fn value_keys_name_message_then_sender() {
        let ring = build_ring(3, 2, 1, &ParticipantParams::default()).unwrap();
        let keys: Vec<&str> = ring.participants()[0]
            .subscriptions
            .iter()
            .map(|s| s.value_key.as_str())
            .collect();
        assert_eq!(keys, vec!["m0::fed1", "m0::fed2"]);

        let fan_in = build_fan_in(2, 1, &ParticipantParams::default());
        let echo = fan_in.participant(ECHO_NAME).unwrap();
        let keys: Vec<&str> = echo
            .subscriptions
            .iter()
            .map(|s| s.value_key.as_str())
            .collect();
        assert_eq!(keys, vec!["sender0_m0", "sender1_m0"]);
        let sender = fan_in.participant("sender1").unwrap();
        assert_eq!(sender.subscriptions[0].value_key, "sender1_m0");
    }

    #[test]
    fn ring_first_participant_records_timing() {
        let topology = build_ring(3, 1, 1, &ParticipantParams::default()).unwrap();
        let recorders: Vec<&str> = topology
            .participants()
            .iter()
            .filter(|p| p.records_timing)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(recorders, vec!["fed0"]);
        assert_eq!(topology.neighbor_count(), Some(1));
    }

    #[test]
    fn fan_in_echo_mirrors_every_sender_topic() {
        let topology = build_fan_in(3, 2, &ParticipantParams::default());
        assert_eq!(topology.participants().len(), 4);

        let echo = topology.participant(ECHO_NAME).unwrap();
        let subs: Vec<&str> = echo.subscription_keys().collect();
        assert_eq!(
            subs,
            vec![
                "sender0/sender0_m0",
                "sender0/sender0_m1",
                "sender1/sender1_m0",
                "sender1/sender1_m1",
                "sender2/sender2_m0",
                "sender2/sender2_m1",
            ]
        );
        let pubs: Vec<&str> = echo.publication_keys().collect();
        assert_eq!(pubs.len(), 6);
        assert_eq!(pubs[0], "sender0_m0");
        assert_eq!(echo.role, ParticipantRole::Echo);
        assert!(echo.records_timing);
    }

    #[test]
    fn fan_in_counts_scale_with_senders_and_messages() {
        let params = ParticipantParams::default();
        for senders in 0..5 {
            for messages in 0..4 {
                let topology = build_fan_in(senders, messages, &params);
                let echo = topology.participant(ECHO_NAME).unwrap();
                assert_eq!(echo.subscriptions.len(), senders * messages);
                assert_eq!(echo.publications.len(), senders * messages);
                assert_unique_keys(echo);

                for index in 0..senders {
                    let sender = topology.participant(&sender_name(index)).unwrap();
                    assert_eq!(sender.subscriptions.len(), messages);
                    assert_eq!(sender.publications.len(), messages);
                    assert_unique_keys(sender);
                    assert!(!sender.records_timing);
                }
                assert!(topology.dangling_subscriptions().is_empty());
            }
        }
    }

    #[test]
    fn fan_in_sender_listens_to_echo_of_its_own_topics() {
        let topology = build_fan_in(2, 2, &ParticipantParams::default());
        let sender = topology.participant("sender1").unwrap();
        let subs: Vec<&str> = sender.subscription_keys().collect();
        assert_eq!(subs, vec!["echo/sender1_m0", "echo/sender1_m1"]);
    }

    #[test]
    fn launch_order_starts_with_echo() {
        let topology = build_fan_in(2, 1, &ParticipantParams::default());
        let order: Vec<&str> = topology.launch_order().map(|p| p.name.as_str()).collect();
        assert_eq!(order, vec!["echo", "sender0", "sender1"]);
    }

    #[test]
    fn participants_share_run_parameters() {
        let params = ParticipantParams {
            log_level: LogLevel::Debug,
            uninterruptible: true,
            core_type: "tcp".to_string(),
            core_tick: "5s".to_string(),
            core_timeout: "10s".to_string(),
            update_interval: 2.5,
        };
        let topology = build_fan_in(1, 1, &params);
        for spec in topology.participants() {
            assert_eq!(spec.log_level, 3);
            assert!(spec.uninterruptible);
            assert_eq!(spec.core_type, "tcp");
            assert_eq!(spec.core_init, "--federates=1 --tick=5s --timeout=10s");
            assert_eq!(spec.period, 2.5);
            assert_eq!(spec.time_delta, 2.5);
            assert_eq!(spec.max_iterations, 1);
        }
    }
}
