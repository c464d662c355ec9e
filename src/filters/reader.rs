use std::cell::RefCell;
use std::rc::Rc;

use crate::data::DataRef;
use crate::foundation::error::{VizError, VizResult};
use crate::pipeline::{Algorithm, ComputeContext, Node, PortDescriptor};
use futures::task::LocalSpawnExt as _;

use crate::runtime::task::{LocalSpawner, Task, promise};

const OUTPUTS: &[PortDescriptor] = &[PortDescriptor::required("output")];

/// Transport used by [`DataSetReader`]; completion is delivered through the returned task.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Task<DataRef>;
}

/// Asynchronous source.
///
/// Pulling never blocks: until a load completes the node reports its prior output (nothing
/// on first use). Completion runs on the render thread's local pool, stores the data and
/// bumps the node's stamp so the next pull republishes it.
#[derive(Default)]
pub struct DataSetReader {
    pub url: String,
    fetcher: Option<Rc<dyn Fetch>>,
    loaded: Rc<RefCell<Option<DataRef>>>,
}

impl DataSetReader {
    pub fn new(url: impl Into<String>, fetcher: Rc<dyn Fetch>) -> Self {
        Self {
            url: url.into(),
            fetcher: Some(fetcher),
            loaded: Rc::default(),
        }
    }

    pub fn set_fetcher(&mut self, fetcher: Rc<dyn Fetch>) {
        self.fetcher = Some(fetcher);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.borrow().is_some()
    }
}

impl Algorithm for DataSetReader {
    fn class_name(&self) -> &'static str {
        "DataSetReader"
    }

    fn output_ports(&self) -> &'static [PortDescriptor] {
        OUTPUTS
    }

    fn request_data(&mut self, ctx: &mut ComputeContext) -> VizResult<()> {
        match self.loaded.borrow().clone() {
            Some(data) => ctx.set_output_ref(0, data),
            None => Ok(()),
        }
    }
}

impl Node<DataSetReader> {
    /// Start loading `url`. The returned task settles once the continuation has run on a
    /// pool driven by `spawner`.
    pub fn load(&self, spawner: &LocalSpawner) -> Task<DataRef> {
        let (fetcher, url, slot) = {
            let p = self.params();
            (p.fetcher.clone(), p.url.clone(), Rc::clone(&p.loaded))
        };
        let Some(fetcher) = fetcher else {
            return Task::failed(VizError::validation(format!(
                "DataSetReader: no fetcher configured for '{url}'"
            )));
        };

        let fetched = fetcher.fetch(&url);
        let node = Rc::downgrade(self.node());
        let (done, task) = promise();
        let target = url.clone();
        let spawned = spawner.spawn_local(async move {
            match fetched.await {
                Ok(data) => {
                    slot.replace(Some(data.clone()));
                    if let Some(node) = node.upgrade() {
                        node.modified();
                    }
                    tracing::debug!(%url, "dataset loaded");
                    done.resolve(data);
                }
                Err(err) => {
                    tracing::warn!(%url, %err, "dataset load failed; keeping previous output");
                    done.reject(err);
                }
            }
        });
        if let Err(err) = spawned {
            // The continuation and its promise are dropped, so the task reports cancellation.
            tracing::error!(url = %target, %err, "dataset load could not be scheduled");
        }
        task
    }
}
