use crate::data::object::DataRef;
use crate::foundation::stamp::Stamp;
use crate::pipeline::node::NodeRef;

/// Static description of one input or output port of an algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortDescriptor {
    pub name: &'static str,
    /// An absent optional input does not block the compute step.
    pub optional: bool,
    /// Only meaningful on the last input port: it grows to accept any number of connections.
    pub repeatable: bool,
}

impl PortDescriptor {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
            repeatable: false,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            optional: true,
            repeatable: false,
        }
    }

    pub const fn repeatable(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
            repeatable: true,
        }
    }
}

/// Handle to one output of a producer. Obtaining it pulls nothing.
#[derive(Clone)]
pub struct OutputPort {
    pub(crate) producer: NodeRef,
    pub(crate) index: usize,
}

impl OutputPort {
    pub fn producer(&self) -> &NodeRef {
        &self.producer
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputPort")
            .field("producer", &self.producer.class_name())
            .field("id", &self.producer.id())
            .field("index", &self.index)
            .finish()
    }
}

#[derive(Clone, Default)]
pub(crate) enum InputSlot {
    #[default]
    Empty,
    Connection(OutputPort),
    /// Constant input. `stamp` is fixed when the data is injected.
    Data { data: DataRef, stamp: Stamp },
}

impl InputSlot {
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[derive(Clone, Default)]
pub(crate) struct OutputSlot {
    pub(crate) data: Option<DataRef>,
    pub(crate) stamp: Stamp,
}

/// What a compute step decided for one output port.
#[derive(Clone, Default)]
pub enum OutputUpdate {
    /// Keep the previous value and its stamp.
    #[default]
    Retain,
    Replace(DataRef),
}
