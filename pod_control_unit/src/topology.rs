//! State topology: the 11 pod states and their directed edges.
//!
//! Built once at startup by [`Topology::build`] and immutable afterwards.
//! Each [`StateNode`] holds a fixed-capacity edge list plus indices of its
//! fault edge and (optional) nominal next edge. Lookups are indexed by
//! [`StateId`], so resolution never depends on string comparison.
//!
//! ## Edge Table
//!
//! | State               | Next        | Fault          |
//! |---------------------|-------------|----------------|
//! | idle                | –           | fault-run      |
//! | pumpdown            | –           | fault-run      |
//! | propulsion          | braking     | fault-run      |
//! | braking             | stopped     | fault-run      |
//! | servicing-precharge | –           | fault-run      |
//! | crawl               | post-run    | fault-run      |
//! | stopped             | –           | fault-run      |
//! | post-run            | –           | fault-run      |
//! | safe-to-approach    | –           | fault-non-run  |
//! | fault-non-run       | –           | –              |
//! | fault-run           | –           | –              |

use heapless::Vec;
use static_assertions::const_assert;
use thiserror::Error;

use pod_common::hardware::PodHardware;
use pod_common::state::{StateId, is_fault_name};

/// Maximum outgoing edges per state (next + fault).
pub const MAX_TRANSITIONS: usize = 2;

/// Expected edge count per state, indexed by `StateId::index()`.
const EXPECTED_EDGES: [usize; StateId::COUNT] = [1, 1, 2, 2, 1, 2, 1, 1, 1, 0, 0];

const_assert!(MAX_TRANSITIONS >= 2);

// ─── Transition ─────────────────────────────────────────────────────

/// Side effect executed when an edge is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAction {
    /// Fault edge. Always succeeds.
    Latch,
    /// Command zero torque before entering a deceleration phase.
    HaltTorque,
}

impl TransitionAction {
    /// Run the action. `false` means the edge must not be taken.
    pub fn execute(self, hardware: &mut dyn PodHardware) -> bool {
        match self {
            Self::Latch => true,
            Self::HaltTorque => hardware.command_no_torque(),
        }
    }
}

/// Directed edge to `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub target: StateId,
    pub action: TransitionAction,
}

// ─── State Node ─────────────────────────────────────────────────────

/// One state and its outgoing edges.
#[derive(Debug, Clone, Default)]
pub struct StateNode {
    transitions: Vec<Transition, MAX_TRANSITIONS>,
    fault: Option<u8>,
    next: Option<u8>,
}

impl StateNode {
    /// All outgoing edges in insertion order.
    #[inline]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    #[inline]
    pub fn fault_transition(&self) -> Option<&Transition> {
        self.fault.and_then(|i| self.transitions.get(i as usize))
    }

    #[inline]
    pub fn next_transition(&self) -> Option<&Transition> {
        self.next.and_then(|i| self.transitions.get(i as usize))
    }

    fn push(&mut self, owner: StateId, transition: Transition) -> Result<u8, TopologyError> {
        if self.transitions.iter().any(|t| t.target == transition.target) {
            return Err(TopologyError::DuplicateEdge {
                from: owner,
                to: transition.target,
            });
        }
        let index = self.transitions.len() as u8;
        self.transitions
            .push(transition)
            .map_err(|_| TopologyError::CapacityExceeded { state: owner })?;
        Ok(index)
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Topology construction defects. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("state '{state}' exceeds its edge capacity")]
    CapacityExceeded { state: StateId },

    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge { from: StateId, to: StateId },

    #[error("state '{state}' has no fault edge")]
    MissingFaultEdge { state: StateId },

    #[error("fault edge of '{state}' targets non-fault state '{target}'")]
    FaultEdgeTarget { state: StateId, target: StateId },

    #[error("fault state '{state}' must not have outgoing edges")]
    FaultStateHasEdges { state: StateId },

    #[error("state '{state}' has {actual} edges, expected {expected}")]
    EdgeCount {
        state: StateId,
        expected: usize,
        actual: usize,
    },
}

// ─── Topology ───────────────────────────────────────────────────────

/// Frozen state graph.
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: [StateNode; StateId::COUNT],
}

impl Topology {
    /// Build and validate the pod lifecycle graph.
    pub fn build() -> Result<Self, TopologyError> {
        let mut builder = TopologyBuilder::new();

        for state in StateId::ALL {
            if state.is_fault() {
                continue;
            }
            let sink = if state == StateId::SafeToApproach {
                StateId::NonRunFault
            } else {
                StateId::RunFault
            };
            builder.fault(state, sink)?;
        }

        builder.next(StateId::Propulsion, StateId::Braking, TransitionAction::HaltTorque)?;
        builder.next(StateId::Braking, StateId::Stopped, TransitionAction::HaltTorque)?;
        builder.next(StateId::Crawl, StateId::PostRun, TransitionAction::HaltTorque)?;

        builder.finish()
    }

    #[inline]
    pub fn node(&self, state: StateId) -> &StateNode {
        &self.nodes[state.index()]
    }

    /// Resolve a state by name. Accepts the same spellings as [`StateId::from_name`].
    pub fn find_state(&self, name: &str) -> Option<StateId> {
        StateId::from_name(name)
    }

    /// Edge from `from` to `target`, if one exists.
    pub fn find_transition(&self, from: StateId, target: StateId) -> Option<Transition> {
        self.node(from)
            .transitions()
            .iter()
            .find(|t| t.target == target)
            .copied()
    }

    /// Fault state reached from `state`.
    ///
    /// Fault states return themselves: they are terminal in place.
    pub fn find_fault_state(&self, state: StateId) -> StateId {
        self.node(state)
            .fault_transition()
            .map_or(state, |t| t.target)
    }

    #[inline]
    pub fn fault_transition(&self, state: StateId) -> Option<Transition> {
        self.node(state).fault_transition().copied()
    }

    #[inline]
    pub fn next_transition(&self, state: StateId) -> Option<Transition> {
        self.node(state).next_transition().copied()
    }

    /// Total edge count across all states.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.transitions.len()).sum()
    }
}

/// Append-only builder; [`finish`](Self::finish) freezes and validates.
struct TopologyBuilder {
    nodes: [StateNode; StateId::COUNT],
}

impl TopologyBuilder {
    fn new() -> Self {
        Self {
            nodes: Default::default(),
        }
    }

    fn fault(&mut self, from: StateId, to: StateId) -> Result<(), TopologyError> {
        let node = &mut self.nodes[from.index()];
        let index = node.push(
            from,
            Transition {
                target: to,
                action: TransitionAction::Latch,
            },
        )?;
        node.fault = Some(index);
        Ok(())
    }

    fn next(
        &mut self,
        from: StateId,
        to: StateId,
        action: TransitionAction,
    ) -> Result<(), TopologyError> {
        let node = &mut self.nodes[from.index()];
        let index = node.push(from, Transition { target: to, action })?;
        node.next = Some(index);
        Ok(())
    }

    fn finish(self) -> Result<Topology, TopologyError> {
        for state in StateId::ALL {
            let node = &self.nodes[state.index()];
            if state.is_fault() {
                if !node.transitions.is_empty() {
                    return Err(TopologyError::FaultStateHasEdges { state });
                }
                continue;
            }
            let fault = node
                .fault_transition()
                .ok_or(TopologyError::MissingFaultEdge { state })?;
            if !is_fault_name(fault.target.name()) {
                return Err(TopologyError::FaultEdgeTarget {
                    state,
                    target: fault.target,
                });
            }
            let expected = EXPECTED_EDGES[state.index()];
            if node.transitions.len() != expected {
                return Err(TopologyError::EdgeCount {
                    state,
                    expected,
                    actual: node.transitions.len(),
                });
            }
        }
        Ok(Topology { nodes: self.nodes })
    }
}
