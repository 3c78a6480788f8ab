// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher: walk a planned route and invoke handler snapshots.
//!
//! An occurrence moves through [`DispatchState`]s:
//! `Idle → RoutingBuilt → Tunneling → Bubbling → Completed`.
//!
//! - [`sequence`] turns a root→target route into visit steps for the
//!   event's [`Routing`]: tunneling root→target, then bubbling target→root.
//! - [`Plan::new`] pairs the steps with handler snapshots taken once, at
//!   dispatch start.
//! - [`run`] walks every step. Marking the occurrence handled never ends the
//!   walk; it only skips later handlers registered without
//!   `invoke_if_handled`. A handler error aborts the walk and is returned.
//!
//! [`Router`](crate::router::Router) drives all of this; the pieces are public
//! so a toolkit can run its own walk over the same plan.
//!
//! ## Minimal example
//!
//! ```
//! use understory_routed_event::dispatcher::{self, Dispatch, Plan, Report};
//! use understory_routed_event::event::Routing;
//! use understory_routed_event::handlers::{HandlerOptions, HandlerTable};
//! use understory_routed_event::event::{Category, RoutedEvent};
//!
//! let tap = RoutedEvent::new("Tap", Category::POINTER);
//! let mut table: HandlerTable<u32, &str> = HandlerTable::new();
//! table.register(1, &tap, "root", HandlerOptions::bubbling());
//! table.register(2, &tap, "child", HandlerOptions::bubbling());
//!
//! // Route 1 → 2; the target is 2.
//! let plan = Plan::new(&[1, 2], tap.routing(), |n| table.snapshot(n, &tap));
//! assert_eq!(plan.steps()[0], Dispatch::tunnel(1));
//!
//! let mut seen = Vec::new();
//! let mut report = Report::default();
//! let mut handled = false;
//! let walk = dispatcher::run(&plan, &mut handled, |_| true, |cb, _| {
//!     seen.push(*cb);
//!     Ok::<(), ()>(())
//! }, &mut report);
//! assert!(walk.is_ok());
//! assert_eq!(seen, ["child", "root"]);
//! assert_eq!(report.visited.len(), 4);
//! ```

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::args::RoutedEventArgs;
use crate::event::Routing;
use crate::handlers::{NodeHandlers, Phase};

/// Lifecycle of one occurrence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing resolved yet.
    Idle,
    /// Route and handler snapshots are ready.
    RoutingBuilt,
    /// Walking root→target.
    Tunneling,
    /// Walking target→root.
    Bubbling,
    /// Every step visited.
    Completed,
}

/// One visit of one node in one phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dispatch<K> {
    /// Phase of the visit.
    pub phase: Phase,
    /// Node visited.
    pub node: K,
}

impl<K> Dispatch<K> {
    /// A tunneling visit.
    pub const fn tunnel(node: K) -> Self {
        Self {
            phase: Phase::Tunneling,
            node,
        }
    }

    /// A bubbling visit.
    pub const fn bubble(node: K) -> Self {
        Self {
            phase: Phase::Bubbling,
            node,
        }
    }
}

/// Visit steps for a root→target `route` under `routing`.
///
/// An empty route yields no steps.
pub fn sequence<K: Copy>(route: &[K], routing: Routing) -> SmallVec<[Dispatch<K>; 32]> {
    let mut out = SmallVec::new();
    let Some(&target) = route.last() else {
        return out;
    };
    match routing {
        Routing::TunnelBubble => {
            out.extend(route.iter().map(|&n| Dispatch::tunnel(n)));
            out.extend(route.iter().rev().map(|&n| Dispatch::bubble(n)));
        }
        Routing::Bubble => {
            out.extend(route.iter().rev().map(|&n| Dispatch::bubble(n)));
        }
        Routing::Direct => {
            out.push(Dispatch::tunnel(target));
            out.push(Dispatch::bubble(target));
        }
    }
    out
}

/// Steps plus handler snapshots for one occurrence.
#[derive(Clone, Debug)]
pub struct Plan<K, H> {
    steps: SmallVec<[Dispatch<K>; 32]>,
    handlers: SmallVec<[(K, NodeHandlers<K, H>); 16]>,
}

impl<K: Copy + Eq, H> Plan<K, H> {
    /// Build the plan, snapshotting each visited node's handlers exactly once.
    pub fn new(
        route: &[K],
        routing: Routing,
        mut snapshot: impl FnMut(K) -> NodeHandlers<K, H>,
    ) -> Self {
        let steps = sequence(route, routing);
        let mut handlers: SmallVec<[(K, NodeHandlers<K, H>); 16]> = SmallVec::new();
        for step in &steps {
            if !handlers.iter().any(|(n, _)| *n == step.node) {
                handlers.push((step.node, snapshot(step.node)));
            }
        }
        Self { steps, handlers }
    }

    /// Visit steps in order.
    pub fn steps(&self) -> &[Dispatch<K>] {
        &self.steps
    }

    /// Snapshot for `node`; `None` if the node is not on the route.
    pub fn handlers(&self, node: K) -> Option<&NodeHandlers<K, H>> {
        self.handlers
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, h)| h)
    }
}

/// What a walk did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report<K> {
    /// Steps visited, in order, including nodes whose handlers were all skipped.
    pub visited: Vec<Dispatch<K>>,
    /// Handlers invoked.
    pub invoked: usize,
    /// Handlers skipped because the occurrence was handled or their element died.
    pub skipped: usize,
}

impl<K> Default for Report<K> {
    fn default() -> Self {
        Self {
            visited: Vec::new(),
            invoked: 0,
            skipped: 0,
        }
    }
}

/// Mutable occurrence state that [`run`] can drive.
///
/// Implemented by [`RoutedEventArgs`]; `bool` serves as a bare handled flag.
pub trait Occurrence<K> {
    /// Whether a handler has marked the occurrence handled.
    fn is_handled(&self) -> bool;
    /// Called before a node's handlers for a phase run.
    fn visit(&mut self, node: K, phase: Phase);
}

impl<K: Copy> Occurrence<K> for RoutedEventArgs<K> {
    fn is_handled(&self) -> bool {
        self.handled()
    }

    fn visit(&mut self, node: K, phase: Phase) {
        self.enter(node, phase);
    }
}

impl<K> Occurrence<K> for bool {
    fn is_handled(&self) -> bool {
        *self
    }

    fn visit(&mut self, _node: K, _phase: Phase) {}
}

/// Walk `plan`, invoking each snapshotted handler through `invoke`.
///
/// - Every step is visited; handled-ness only skips individual handlers
///   whose `invoke_if_handled` is `false`.
/// - Entries whose element fails `is_alive` are skipped.
/// - The first `Err` from `invoke` aborts the walk and is returned; later
///   steps are not visited.
pub fn run<K, H, O, E>(
    plan: &Plan<K, H>,
    occurrence: &mut O,
    is_alive: impl Fn(K) -> bool,
    mut invoke: impl FnMut(&H, &mut O) -> Result<(), E>,
    report: &mut Report<K>,
) -> Result<(), E>
where
    K: Copy + Eq + core::fmt::Debug,
    O: Occurrence<K>,
{
    let mut state = DispatchState::RoutingBuilt;
    for step in plan.steps() {
        let next = match step.phase {
            Phase::Tunneling => DispatchState::Tunneling,
            Phase::Bubbling => DispatchState::Bubbling,
        };
        if next != state {
            tracing::trace!(from = ?state, to = ?next, "dispatch state");
            state = next;
        }
        occurrence.visit(step.node, step.phase);
        report.visited.push(*step);
        let Some(handlers) = plan.handlers(step.node) else {
            continue;
        };
        for entry in handlers.phase(step.phase) {
            if occurrence.is_handled() && !entry.invoke_if_handled {
                tracing::trace!(node = ?step.node, token = ?entry.token, "handled; skipped");
                report.skipped += 1;
                continue;
            }
            if !is_alive(entry.element) {
                tracing::trace!(node = ?entry.element, "element gone; handler skipped");
                report.skipped += 1;
                continue;
            }
            report.invoked += 1;
            invoke(&entry.callback, occurrence)?;
        }
    }
    tracing::trace!(from = ?state, to = ?DispatchState::Completed, "dispatch state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Category, RoutedEvent};
    use crate::handlers::{HandlerOptions, HandlerTable};
    use alloc::vec;

    type Table = HandlerTable<u32, &'static str>;

    fn tap() -> RoutedEvent {
        RoutedEvent::new("Tap", Category::POINTER | Category::GESTURE)
    }

    /// Handler names are `"<name>"`; a leading `!` marks the occurrence handled.
    fn walk(
        table: &Table,
        ev: &RoutedEvent,
        route: &[u32],
    ) -> (Vec<&'static str>, Report<u32>, bool) {
        let plan = Plan::new(route, ev.routing(), |n| table.snapshot(n, ev));
        let mut seen = Vec::new();
        let mut report = Report::default();
        let mut handled = false;
        let res: Result<(), ()> = run(
            &plan,
            &mut handled,
            |_| true,
            |cb, h| {
                seen.push(*cb);
                if cb.starts_with('!') {
                    *h = true;
                }
                Ok(())
            },
            &mut report,
        );
        assert!(res.is_ok());
        (seen, report, handled)
    }

    #[test]
    fn sequences_per_routing() {
        assert_eq!(
            sequence(&[1, 2, 3], Routing::TunnelBubble).as_slice(),
            &[
                Dispatch::tunnel(1),
                Dispatch::tunnel(2),
                Dispatch::tunnel(3),
                Dispatch::bubble(3),
                Dispatch::bubble(2),
                Dispatch::bubble(1),
            ]
        );
        assert_eq!(
            sequence(&[1, 2, 3], Routing::Bubble).as_slice(),
            &[Dispatch::bubble(3), Dispatch::bubble(2), Dispatch::bubble(1)]
        );
        assert_eq!(
            sequence(&[1, 2, 3], Routing::Direct).as_slice(),
            &[Dispatch::tunnel(3), Dispatch::bubble(3)]
        );
        assert!(sequence::<u32>(&[], Routing::TunnelBubble).is_empty());
    }

    #[test]
    fn bubbling_visits_target_to_root() {
        let ev = tap();
        let mut t = Table::new();
        t.register(1, &ev, "root", HandlerOptions::bubbling());
        t.register(2, &ev, "parent", HandlerOptions::bubbling());
        t.register(3, &ev, "child", HandlerOptions::bubbling());
        let (seen, report, handled) = walk(&t, &ev, &[1, 2, 3]);
        assert_eq!(seen, vec!["child", "parent", "root"]);
        assert_eq!(report.visited.len(), 6);
        assert!(!handled);
    }

    #[test]
    fn tunneling_runs_before_bubbling() {
        let ev = tap();
        let mut t = Table::new();
        t.register(2, &ev, "b2", HandlerOptions::bubbling());
        t.register(1, &ev, "t1", HandlerOptions::tunneling());
        t.register(2, &ev, "t2", HandlerOptions::tunneling());
        t.register(1, &ev, "b1", HandlerOptions::bubbling());
        let (seen, _, _) = walk(&t, &ev, &[1, 2]);
        assert_eq!(seen, vec!["t1", "t2", "b2", "b1"]);
    }

    #[test]
    fn handled_skips_per_handler_not_per_node() {
        let ev = tap();
        let mut t = Table::new();
        t.register(2, &ev, "!parent", HandlerOptions::bubbling());
        t.register(2, &ev, "parent-late", HandlerOptions::bubbling());
        let always = HandlerOptions::bubbling().invoke_if_handled(true);
        t.register(2, &ev, "parent-always", always);
        t.register(1, &ev, "root", HandlerOptions::bubbling());
        t.register(1, &ev, "root-always", always);
        let (seen, report, handled) = walk(&t, &ev, &[1, 2, 3]);
        assert_eq!(seen, vec!["!parent", "parent-always", "root-always"]);
        assert!(handled);
        assert_eq!(report.skipped, 2);
        // Root's node is still visited.
        assert_eq!(report.visited.last(), Some(&Dispatch::bubble(1)));
    }

    #[test]
    fn direct_routing_only_visits_target() {
        let ev = RoutedEvent::with_options(
            "Entered",
            Category::POINTER,
            crate::event::EventOptions {
                routing: Routing::Direct,
                ..Default::default()
            },
        );
        let mut t = Table::new();
        t.register(1, &ev, "root", HandlerOptions::bubbling());
        t.register(2, &ev, "target-bubble", HandlerOptions::bubbling());
        t.register(2, &ev, "target-tunnel", HandlerOptions::tunneling());
        let (seen, report, _) = walk(&t, &ev, &[1, 2]);
        assert_eq!(seen, vec!["target-tunnel", "target-bubble"]);
        assert_eq!(report.visited.len(), 2);
    }

    #[test]
    fn error_aborts_remaining_route() {
        let ev = tap();
        let mut t = Table::new();
        t.register(3, &ev, "child", HandlerOptions::bubbling());
        t.register(2, &ev, "fail", HandlerOptions::bubbling());
        t.register(2, &ev, "after-fail", HandlerOptions::bubbling());
        t.register(1, &ev, "root", HandlerOptions::bubbling());
        let plan = Plan::new(&[1, 2, 3], Routing::Bubble, |n| t.snapshot(n, &ev));
        let mut seen = Vec::new();
        let mut report = Report::default();
        let res = run(
            &plan,
            &mut false,
            |_| true,
            |cb, _| {
                seen.push(*cb);
                if *cb == "fail" { Err("boom") } else { Ok(()) }
            },
            &mut report,
        );
        assert_eq!(res, Err("boom"));
        assert_eq!(seen, vec!["child", "fail"]);
        assert_eq!(report.visited, vec![Dispatch::bubble(3), Dispatch::bubble(2)]);
    }

    #[test]
    fn dead_elements_are_skipped() {
        let ev = tap();
        let mut t = Table::new();
        t.register(1, &ev, "root", HandlerOptions::bubbling());
        t.register(2, &ev, "dead", HandlerOptions::bubbling());
        let plan = Plan::new(&[1, 2], Routing::Bubble, |n| t.snapshot(n, &ev));
        let mut seen = Vec::new();
        let mut report = Report::default();
        let res: Result<(), ()> = run(
            &plan,
            &mut false,
            |n| n != 2,
            |cb, _| {
                seen.push(*cb);
                Ok(())
            },
            &mut report,
        );
        assert!(res.is_ok());
        assert_eq!(seen, vec!["root"]);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.visited.len(), 2);
    }

    #[test]
    fn plan_snapshots_each_node_once() {
        let ev = tap();
        let t = Table::new();
        let mut calls = Vec::new();
        let plan = Plan::new(&[1, 2, 3], Routing::TunnelBubble, |n| {
            calls.push(n);
            t.snapshot(n, &ev)
        });
        assert_eq!(calls, vec![1, 2, 3]);
        assert!(plan.handlers(2).is_some());
        assert!(plan.handlers(9).is_none());
    }

    #[test]
    fn args_track_current_target_and_phase() {
        let ev = tap();
        let mut t = Table::new();
        t.register(1, &ev, "root", HandlerOptions::tunneling());
        t.register(2, &ev, "child", HandlerOptions::bubbling());
        let plan = Plan::new(&[1, 2], ev.routing(), |n| t.snapshot(n, &ev));
        let mut args = RoutedEventArgs::new(ev.clone(), 2_u32, crate::args::Payload::None);
        let mut seen = Vec::new();
        let res: Result<(), ()> = run(
            &plan,
            &mut args,
            |_| true,
            |_, a| {
                seen.push((a.current_target(), a.phase(), a.source()));
                Ok(())
            },
            &mut Report::default(),
        );
        assert!(res.is_ok());
        assert_eq!(seen, vec![(1, Phase::Tunneling, 2), (2, Phase::Bubbling, 2)]);
    }
}
