use slotmap::SlotMap;

use crate::scene::{Node, NodeHandle, Skeleton};

/// Supplies the baseline value the composer folds layers onto each frame.
///
/// The composition algorithm itself is policy-blind; the two policies differ
/// only in what a bone's node holds when the first layer is applied.
pub trait BaselineProvider {
    /// Called once per frame, before any layer is applied.
    fn prepare(&self, skeleton: &Skeleton, nodes: &mut SlotMap<NodeHandle, Node>);
}

/// Reseed every animated bone from the bind pose each frame.
///
/// Guarantees no drift and no interference from other writers of the bone
/// nodes; any externally-applied local transform is overwritten before
/// blending begins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullReset;

impl BaselineProvider for FullReset {
    fn prepare(&self, skeleton: &Skeleton, nodes: &mut SlotMap<NodeHandle, Node>) {
        skeleton.reset_silent(nodes);
    }
}

/// Leave bone nodes untouched: the baseline is whatever each node holds at
/// the start of the frame, i.e. the previous frame's composed result or any
/// external change made since.
///
/// External code can layer transforms on top of the animation stack, but
/// stale contributions never reset on their own; convergence is the
/// caller's responsibility.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftReset;

impl BaselineProvider for SoftReset {
    fn prepare(&self, _skeleton: &Skeleton, _nodes: &mut SlotMap<NodeHandle, Node>) {}
}
