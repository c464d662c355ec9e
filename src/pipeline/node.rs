//! Execution nodes and the demand-driven executor.
//!
//! A node wraps an [`Algorithm`] with input slots, cached outputs and the stamp of its last
//! execution. Pulling a node (`update`) first pulls its producers depth-first in ascending input
//! order, then re-runs the algorithm only when the node's own parameters or any upstream output
//! is newer than its last execution.

use std::cell::{Cell, Ref, RefCell};
use std::ops::Deref;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::data::object::{DataObject, DataRef, downcast_data};
use crate::foundation::error::{PortDirection, VizError, VizResult};
use crate::foundation::stamp::{ObjectId, Stamp, Stamped};
use crate::pipeline::algorithm::{Algorithm, ComputeContext};
use crate::pipeline::params;
use crate::pipeline::port::{InputSlot, OutputPort, OutputSlot, OutputUpdate, PortDescriptor};

pub type NodeRef = Rc<ExecutionNode>;

/// Execution counters, mostly for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Times the algorithm's compute step was invoked.
    pub executions: u64,
    /// Pulls that found the node up to date.
    pub skipped: u64,
    /// Pulls that ended with a missing input or a compute error.
    pub failures: u64,
}

pub struct ExecutionNode {
    stamped: Stamped,
    class_name: &'static str,
    input_ports: &'static [PortDescriptor],
    output_ports: &'static [PortDescriptor],
    algorithm: Rc<RefCell<dyn Algorithm>>,
    inputs: RefCell<SmallVec<[InputSlot; 2]>>,
    outputs: RefCell<SmallVec<[OutputSlot; 1]>>,
    computed_at: Cell<Stamp>,
    /// Newest input stamp seen by the last failed pull, [`Stamp::ZERO`] after a success.
    failed_at: Cell<Stamp>,
    updating: Cell<bool>,
    stats: Cell<NodeStats>,
    last_error: RefCell<Option<String>>,
}

struct UpdateGuard<'a>(&'a Cell<bool>);

impl<'a> UpdateGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl ExecutionNode {
    pub fn from_algorithm(algorithm: Rc<RefCell<dyn Algorithm>>) -> Self {
        let (class_name, input_ports, output_ports) = {
            let a = algorithm.borrow();
            (a.class_name(), a.input_ports(), a.output_ports())
        };
        Self {
            stamped: Stamped::new(),
            class_name,
            input_ports,
            output_ports,
            algorithm,
            inputs: RefCell::new(input_ports.iter().map(|_| InputSlot::Empty).collect()),
            outputs: RefCell::new(output_ports.iter().map(|_| OutputSlot::default()).collect()),
            computed_at: Cell::new(Stamp::ZERO),
            failed_at: Cell::new(Stamp::ZERO),
            updating: Cell::new(false),
            stats: Cell::new(NodeStats::default()),
            last_error: RefCell::new(None),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.stamped.id()
    }

    pub fn stamped(&self) -> &Stamped {
        &self.stamped
    }

    /// Parameter stamp. Connection changes count as parameter changes.
    pub fn stamp(&self) -> Stamp {
        self.stamped.stamp()
    }

    pub fn modified(&self) -> Stamp {
        self.stamped.modified()
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn num_input_ports(&self) -> usize {
        self.input_ports.len()
    }

    pub fn num_output_ports(&self) -> usize {
        self.output_ports.len()
    }

    /// Number of input slots, including the extra slots of a repeatable port.
    pub fn num_input_slots(&self) -> usize {
        self.inputs.borrow().len()
    }

    pub fn stats(&self) -> NodeStats {
        self.stats.get()
    }

    pub fn compute_count(&self) -> u64 {
        self.stats.get().executions
    }

    /// Message of the last failed pull, cleared by the next successful compute.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// Stamp of the last execution attempt, or [`Stamp::ZERO`] if never pulled.
    pub fn computed_at(&self) -> Stamp {
        self.computed_at.get()
    }

    pub fn output_port(self: &Rc<Self>, index: usize) -> OutputPort {
        OutputPort {
            producer: Rc::clone(self),
            index,
        }
    }

    fn repeatable_tail(&self) -> bool {
        self.input_ports.last().is_some_and(|p| p.repeatable)
    }

    fn input_out_of_range(&self, index: usize) -> VizError {
        VizError::PortOutOfRange {
            node: self.class_name.to_owned(),
            index,
            available: self.num_input_slots(),
            direction: PortDirection::Input,
        }
    }

    fn place_input(&self, index: usize, slot: InputSlot) -> VizResult<()> {
        {
            let mut inputs = self.inputs.borrow_mut();
            if index < inputs.len() {
                inputs[index] = slot;
            } else if index == inputs.len() && self.repeatable_tail() {
                inputs.push(slot);
            } else {
                drop(inputs);
                return Err(self.input_out_of_range(index));
            }
        }
        self.modified();
        Ok(())
    }

    fn first_free_input(&self) -> VizResult<usize> {
        let inputs = self.inputs.borrow();
        let start = self.input_ports.len().saturating_sub(1);
        let free = if self.repeatable_tail() {
            // Fan-in ports fill from the repeatable port onward.
            (start..inputs.len())
                .find(|&i| inputs[i].is_empty())
                .unwrap_or(inputs.len())
        } else {
            match inputs.iter().position(InputSlot::is_empty) {
                Some(i) => i,
                None => {
                    return Err(VizError::pipeline(format!(
                        "{}: all {} input ports are connected",
                        self.class_name,
                        inputs.len()
                    )));
                }
            }
        };
        Ok(free)
    }

    /// Replace whatever feeds `input_index` with a connection from `port`.
    pub fn set_input_connection(&self, port: &OutputPort, input_index: usize) -> VizResult<()> {
        let available = port.producer.num_output_ports();
        if port.index >= available {
            return Err(VizError::PortOutOfRange {
                node: port.producer.class_name().to_owned(),
                index: port.index,
                available,
                direction: PortDirection::Output,
            });
        }
        if std::ptr::eq(Rc::as_ptr(&port.producer), self) {
            return Err(VizError::PipelineCycle {
                node: self.class_name.to_owned(),
            });
        }
        self.place_input(input_index, InputSlot::Connection(port.clone()))
    }

    /// Connect `port` to the first free input slot and return its index.
    pub fn add_input_connection(&self, port: &OutputPort) -> VizResult<usize> {
        let index = self.first_free_input()?;
        self.set_input_connection(port, index)?;
        Ok(index)
    }

    /// Feed a constant data object into `input_index`.
    pub fn set_input_data(&self, data: DataRef, input_index: usize) -> VizResult<()> {
        self.place_input(
            input_index,
            InputSlot::Data {
                data,
                stamp: Stamp::next(),
            },
        )
    }

    pub fn add_input_data(&self, data: DataRef) -> VizResult<usize> {
        let index = self.first_free_input()?;
        self.set_input_data(data, index)?;
        Ok(index)
    }

    /// Disconnect `input_index`. The input reads as absent on the next pull.
    pub fn remove_input_connection(&self, input_index: usize) -> VizResult<()> {
        {
            let mut inputs = self.inputs.borrow_mut();
            if input_index >= inputs.len() {
                drop(inputs);
                return Err(self.input_out_of_range(input_index));
            }
            if input_index >= self.input_ports.len() {
                inputs.remove(input_index);
            } else {
                inputs[input_index] = InputSlot::Empty;
            }
        }
        self.modified();
        Ok(())
    }

    pub fn input_connection(&self, input_index: usize) -> Option<OutputPort> {
        match self.inputs.borrow().get(input_index) {
            Some(InputSlot::Connection(port)) => Some(port.clone()),
            _ => None,
        }
    }

    /// Cached value and stamp of an output without pulling.
    pub fn cached_output(&self, index: usize) -> Option<(DataRef, Stamp)> {
        let outputs = self.outputs.borrow();
        let slot = outputs.get(index)?;
        slot.data.clone().map(|d| (d, slot.stamp))
    }

    fn has_all_outputs(&self) -> bool {
        self.outputs.borrow().iter().all(|s| s.data.is_some())
    }

    fn output_stamp(&self, index: usize) -> Option<Stamp> {
        self.outputs.borrow().get(index).map(|s| s.stamp)
    }

    /// Pull, then return the cached output.
    pub fn output_data(&self, index: usize) -> Option<DataRef> {
        self.update();
        self.cached_output(index).map(|(d, _)| d)
    }

    /// Bring this node and everything upstream up to date. Failures are logged, never raised.
    pub fn update(&self) {
        if let Err(err) = self.try_update() {
            tracing::warn!(node = self.class_name, id = %self.id(), %err, "pipeline update abandoned");
        }
    }

    /// Like [`ExecutionNode::update`] but reports structural errors such as cycles.
    ///
    /// Returns `true` when the compute step ran. Missing inputs and compute failures are still
    /// absorbed here: they are logged and recorded in [`ExecutionNode::last_error`].
    #[tracing::instrument(level = "trace", skip_all, fields(node = self.class_name))]
    pub fn try_update(&self) -> VizResult<bool> {
        if self.updating.get() {
            return Err(VizError::PipelineCycle {
                node: self.class_name.to_owned(),
            });
        }
        let _guard = UpdateGuard::enter(&self.updating);

        let slots: SmallVec<[InputSlot; 2]> = self.inputs.borrow().clone();
        let mut newest = self.stamp();
        let mut resolved = Vec::with_capacity(slots.len());
        for slot in slots {
            let value = match slot {
                InputSlot::Empty => None,
                InputSlot::Connection(port) => {
                    port.producer.try_update()?;
                    match port.producer.output_stamp(port.index) {
                        Some(stamp) => {
                            newest = newest.max(stamp);
                            port.producer.cached_output(port.index).map(|(d, _)| d)
                        }
                        None => {
                            tracing::error!(
                                producer = port.producer.class_name(),
                                index = port.index,
                                "producer has no such output; treating input as absent"
                            );
                            None
                        }
                    }
                }
                InputSlot::Data { data, stamp } => {
                    newest = newest.max(stamp).max(data.stamp());
                    Some(data)
                }
            };
            resolved.push(value);
        }

        let computed_at = self.computed_at.get();
        if !computed_at.is_zero()
            && !newest.is_newer_than(computed_at)
            && self.has_all_outputs()
        {
            self.bump_stats(|s| s.skipped += 1);
            return Ok(false);
        }

        if let Some(port) = self.missing_required_input(&resolved) {
            let msg = format!("{}: required input '{port}' is not connected", self.class_name);
            if self.fail(msg, newest) {
                tracing::warn!(
                    node = self.class_name,
                    port,
                    "missing required input; output retained"
                );
            }
            return Ok(false);
        }

        let previous = self
            .outputs
            .borrow()
            .iter()
            .map(|s| s.data.clone())
            .collect();
        let mut ctx = ComputeContext::new(self.class_name, resolved, previous);
        let result = match self.algorithm.try_borrow_mut() {
            Ok(mut alg) => alg.request_data(&mut ctx),
            Err(_) => Err(VizError::pipeline(format!(
                "{}: algorithm re-entered during compute",
                self.class_name
            ))),
        };
        self.bump_stats(|s| s.executions += 1);

        match result {
            Ok(()) => {
                let mut outputs = self.outputs.borrow_mut();
                for (slot, update) in outputs.iter_mut().zip(ctx.into_updates()) {
                    if let OutputUpdate::Replace(data) = update {
                        slot.data = Some(data);
                        slot.stamp = Stamp::next();
                    }
                }
                drop(outputs);
                self.last_error.replace(None);
                self.failed_at.set(Stamp::ZERO);
                self.computed_at.set(Stamp::next());
            }
            Err(err) => {
                if self.fail(err.to_string(), newest) {
                    tracing::warn!(
                        node = self.class_name,
                        %err,
                        "compute failed; outputs retained"
                    );
                } else {
                    tracing::debug!(node = self.class_name, %err, "compute failed again");
                }
            }
        }
        Ok(true)
    }

    fn missing_required_input(&self, resolved: &[Option<DataRef>]) -> Option<&'static str> {
        let last = self.input_ports.len().saturating_sub(1);
        self.input_ports
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.optional)
            .find(|&(i, p)| {
                if p.repeatable && i == last {
                    resolved.iter().skip(i).all(Option::is_none)
                } else {
                    resolved.get(i).is_none_or(Option::is_none)
                }
            })
            .map(|(_, p)| p.name)
    }

    // A failed attempt counts as executed, so a node that still holds every output keeps
    // serving it until something changes. A node with a missing output retries on each pull.
    // Returns whether this failure is new for the current inputs.
    fn fail(&self, msg: String, newest: Stamp) -> bool {
        self.bump_stats(|s| s.failures += 1);
        self.last_error.replace(Some(msg));
        self.computed_at.set(Stamp::next());
        self.failed_at.replace(newest) != newest
    }

    fn bump_stats(&self, f: impl FnOnce(&mut NodeStats)) {
        let mut s = self.stats.get();
        f(&mut s);
        self.stats.set(s);
    }
}

impl std::fmt::Debug for ExecutionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionNode")
            .field("class_name", &self.class_name)
            .field("id", &self.id())
            .field("stamp", &self.stamp())
            .field("computed_at", &self.computed_at.get())
            .field("stats", &self.stats.get())
            .finish()
    }
}

/// Typed handle: the shared node plus direct access to its algorithm parameters.
pub struct Node<A: Algorithm> {
    node: NodeRef,
    algorithm: Rc<RefCell<A>>,
}

impl<A: Algorithm> Node<A> {
    pub fn new(algorithm: A) -> Self {
        let algorithm = Rc::new(RefCell::new(algorithm));
        let erased: Rc<RefCell<dyn Algorithm>> = algorithm.clone();
        Self {
            node: Rc::new(ExecutionNode::from_algorithm(erased)),
            algorithm,
        }
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn output_port(&self, index: usize) -> OutputPort {
        self.node.output_port(index)
    }

    pub fn params(&self) -> Ref<'_, A> {
        self.algorithm.borrow()
    }

    /// Mutate parameters as one logical change: exactly one stamp bump.
    pub fn configure<R>(&self, f: impl FnOnce(&mut A) -> R) -> R {
        let out = f(&mut self.algorithm.borrow_mut());
        self.node.modified();
        out
    }

    /// Typed output of the last successful compute, pulling first.
    pub fn output<T: DataObject>(&self, index: usize) -> Option<Rc<T>> {
        self.node
            .output_data(index)
            .and_then(|d| downcast_data::<T>(&d))
    }
}

impl<A> Node<A>
where
    A: Algorithm + Default + serde::Serialize + serde::de::DeserializeOwned,
{
    /// Build from a JSON object of named initial values; unnamed parameters keep defaults.
    pub fn with_values(values: &serde_json::Value) -> VizResult<Self> {
        let node = Self::new(A::default());
        node.apply_values(values)?;
        Ok(node)
    }

    /// Merge named values into the current parameters. One stamp bump if anything changed.
    ///
    /// Parameters are rebuilt from JSON, so fields serde skips fall back to their defaults.
    pub fn set_values(&self, values: &serde_json::Value) -> VizResult<bool> {
        let changed = self.apply_values(values)?;
        if changed {
            self.node.modified();
        }
        Ok(changed)
    }

    /// Current parameters as a JSON object.
    pub fn state(&self) -> VizResult<serde_json::Value> {
        Ok(serde_json::to_value(&*self.algorithm.borrow())?)
    }

    fn apply_values(&self, values: &serde_json::Value) -> VizResult<bool> {
        let before = self.state()?;
        let mut merged = before.clone();
        params::merge_values(self.node.class_name(), &mut merged, values)?;
        if merged == before {
            return Ok(false);
        }
        let next: A = serde_json::from_value(merged)?;
        *self.algorithm.borrow_mut() = next;
        Ok(true)
    }
}

impl<A: Algorithm> Clone for Node<A> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
            algorithm: Rc::clone(&self.algorithm),
        }
    }
}

impl<A: Algorithm> Deref for Node<A> {
    type Target = ExecutionNode;

    fn deref(&self) -> &ExecutionNode {
        &self.node
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/node.rs"]
mod tests;
