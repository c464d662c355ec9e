use std::any::Any;
use std::rc::Rc;

use crate::data::object::{DataObject, DataRef, downcast_data};
use crate::foundation::error::{PortDirection, VizError, VizResult};
use crate::pipeline::port::{OutputUpdate, PortDescriptor};

/// The compute half of an execution node.
///
/// Implementations are plain parameter structs; the node they are wrapped in owns ports,
/// connections, cached outputs and staleness bookkeeping.
pub trait Algorithm: Any {
    fn class_name(&self) -> &'static str;

    fn input_ports(&self) -> &'static [PortDescriptor] {
        &[]
    }

    fn output_ports(&self) -> &'static [PortDescriptor];

    /// Produce outputs from the resolved inputs. Outputs not written are retained.
    fn request_data(&mut self, ctx: &mut ComputeContext) -> VizResult<()>;
}

/// Inputs, previous outputs and pending output writes of one compute step.
pub struct ComputeContext {
    class_name: &'static str,
    inputs: Vec<Option<DataRef>>,
    previous: Vec<Option<DataRef>>,
    updates: Vec<OutputUpdate>,
}

impl ComputeContext {
    pub(crate) fn new(
        class_name: &'static str,
        inputs: Vec<Option<DataRef>>,
        previous: Vec<Option<DataRef>>,
    ) -> Self {
        let updates = vec![OutputUpdate::Retain; previous.len()];
        Self {
            class_name,
            inputs,
            previous,
            updates,
        }
    }

    pub(crate) fn into_updates(self) -> Vec<OutputUpdate> {
        self.updates
    }

    /// Number of input slots, including repeated ones.
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn input(&self, index: usize) -> Option<&DataRef> {
        self.inputs.get(index).and_then(Option::as_ref)
    }

    /// Present inputs from `first` onward, in slot order. Used by fan-in algorithms.
    pub fn inputs_from(&self, first: usize) -> impl Iterator<Item = &DataRef> + '_ {
        self.inputs.iter().skip(first).flatten()
    }

    pub fn input_as<T: DataObject>(&self, index: usize) -> VizResult<Rc<T>> {
        let data = self.input(index).ok_or_else(|| {
            VizError::pipeline(format!("{}: input {index} is empty", self.class_name))
        })?;
        downcast_data::<T>(data).ok_or_else(|| {
            VizError::pipeline(format!(
                "{}: input {index} is a {}, expected {}",
                self.class_name,
                data.class_name(),
                std::any::type_name::<T>()
            ))
        })
    }

    pub fn previous_output(&self, index: usize) -> Option<&DataRef> {
        self.previous.get(index).and_then(Option::as_ref)
    }

    pub fn set_output(&mut self, index: usize, data: impl DataObject) -> VizResult<()> {
        self.set_output_ref(index, Rc::new(data))
    }

    pub fn set_output_ref(&mut self, index: usize, data: DataRef) -> VizResult<()> {
        let available = self.updates.len();
        let slot = self
            .updates
            .get_mut(index)
            .ok_or_else(|| VizError::PortOutOfRange {
                node: self.class_name.to_owned(),
                index,
                available,
                direction: PortDirection::Output,
            })?;
        *slot = OutputUpdate::Replace(data);
        Ok(())
    }
}
