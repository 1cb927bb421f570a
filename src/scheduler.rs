use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::error::{FacetError, TessellationError};
use crate::model::{Document, ItemId, ShapeId};
use crate::tessellation::{Mesh, MeshOptions, Tessellator};

/// Result of one tessellation job, sent back from a worker.
enum JobOutcome {
    Done(Mesh),
    Failed { item: ItemId, error: FacetError },
}

/// Bounded pool of mesher threads with a single result channel.
///
/// Jobs are accepted without blocking and delivered in completion order.
/// Every accepted job is accounted for exactly once by [`get_result`]:
/// successful meshes are returned, failures are logged and dropped.
///
/// [`get_result`]: MeshScheduler::get_result
pub struct MeshScheduler {
    doc: Arc<Document>,
    tessellator: Arc<dyn Tessellator>,
    pool: ThreadPool,
    tx: Sender<JobOutcome>,
    rx: Receiver<JobOutcome>,
    queue_limit: Option<usize>,
    outstanding: usize,
    submitted: usize,
}

impl MeshScheduler {
    /// Starts a mesher pool sized by `options.threads`.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the thread pool
    /// cannot be created.
    pub fn new(
        doc: Arc<Document>,
        tessellator: Arc<dyn Tessellator>,
        options: &MeshOptions,
    ) -> Result<Self, TessellationError> {
        options.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(options.threads.unwrap_or(0))
            .thread_name(|i| format!("mesher-{i}"))
            .build()
            .map_err(|e| TessellationError::Pool(e.to_string()))?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            doc,
            tessellator,
            pool,
            tx,
            rx,
            queue_limit: options.queue_limit,
            outstanding: 0,
            submitted: 0,
        })
    }

    #[must_use]
    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    #[must_use]
    pub fn tessellator(&self) -> &dyn Tessellator {
        self.tessellator.as_ref()
    }

    /// Queues `item` for meshing in the context of `shape`.
    ///
    /// Returns `false` without queueing when the pool already holds
    /// `queue_limit` jobs or the item has no faces. Callers check
    /// tessellability and earlier submissions first.
    pub fn start_mesh(&mut self, shape: ShapeId, item: ItemId, options: &MeshOptions) -> bool {
        if self.is_full() {
            debug!(outstanding = self.outstanding, "mesh queue full");
            return false;
        }
        let Ok(data) = self.doc.item(item) else {
            return false;
        };
        match data.brep() {
            Some(brep) if !brep.is_degenerate() => {}
            _ => {
                debug!(solid = %data.entity_id, "degenerate solid not queued");
                return false;
            }
        }
        debug!(solid = %data.entity_id, "mesh queued");

        let doc = Arc::clone(&self.doc);
        let tessellator = Arc::clone(&self.tessellator);
        let tx = self.tx.clone();
        let options = *options;
        self.pool.spawn(move || {
            let outcome = match tessellator.make_mesh(&doc, shape, item, &options) {
                Ok(mesh) => JobOutcome::Done(mesh),
                Err(error) => JobOutcome::Failed { item, error },
            };
            let _ = tx.send(outcome);
        });

        self.outstanding += 1;
        self.submitted += 1;
        true
    }

    /// Takes one completed mesh.
    ///
    /// With `block`, waits until a mesh arrives and returns `None` only once
    /// every accepted job has been accounted for. Without it, returns `None`
    /// as soon as nothing is ready.
    pub fn get_result(&mut self, block: bool) -> Option<Mesh> {
        while self.outstanding > 0 {
            let outcome = if block {
                self.rx.recv().ok()?
            } else {
                self.rx.try_recv().ok()?
            };
            self.outstanding -= 1;
            match outcome {
                JobOutcome::Done(mesh) => {
                    debug!(solid = %mesh.solid_id(), facets = mesh.facet_count(), "mesh completed");
                    return Some(mesh);
                }
                JobOutcome::Failed { item, error } => {
                    let solid = self.doc.item(item).map(|i| i.entity_id.get()).unwrap_or(0);
                    warn!(solid, %error, "tessellation failed, solid dropped");
                }
            }
        }
        None
    }

    /// Returns `true` if [`start_mesh`](Self::start_mesh) would be refused
    /// for lack of queue space.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue_limit.is_some_and(|limit| self.outstanding >= limit)
    }

    /// Jobs accepted but not yet returned by [`get_result`](Self::get_result).
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Total jobs accepted over the scheduler's lifetime.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::tessellation::BrepTessellator;
    use crate::test_support;

    struct Failing;

    impl Tessellator for Failing {
        fn can_make(&self, _doc: &Document, _shape: ShapeId, _item: ItemId) -> bool {
            true
        }

        fn is_shell(&self, _doc: &Document, _shape: ShapeId, _item: ItemId) -> bool {
            true
        }

        fn make_mesh(
            &self,
            _doc: &Document,
            _shape: ShapeId,
            _item: ItemId,
            _options: &MeshOptions,
        ) -> Result<Mesh> {
            Err(TessellationError::Failed("always".into()).into())
        }
    }

    fn scheduler(
        tessellator: Arc<dyn Tessellator>,
        options: &MeshOptions,
    ) -> (test_support::Fixture, MeshScheduler) {
        let fx = test_support::two_instance_assembly();
        let s = MeshScheduler::new(Arc::clone(&fx.doc), tessellator, options).unwrap();
        (fx, s)
    }

    #[test]
    fn blocking_drain_returns_every_mesh_then_none() {
        let options = MeshOptions {
            threads: Some(2),
            ..MeshOptions::default()
        };
        let (fx, mut s) = scheduler(Arc::new(BrepTessellator), &options);
        assert!(s.start_mesh(fx.part_shape, fx.solid, &options));
        assert_eq!(s.outstanding(), 1);

        let mesh = s.get_result(true).unwrap();
        assert_eq!(mesh.item(), fx.solid);
        assert_eq!(mesh.facet_count(), 1);
        assert!(s.get_result(true).is_none());
        assert_eq!(s.outstanding(), 0);
        assert_eq!(s.submitted(), 1);
    }

    #[test]
    fn polling_eventually_yields_the_mesh() {
        let options = MeshOptions::default();
        let (fx, mut s) = scheduler(Arc::new(BrepTessellator), &options);
        assert!(s.get_result(false).is_none());
        assert!(s.start_mesh(fx.part_shape, fx.solid, &options));
        let mesh = loop {
            if let Some(mesh) = s.get_result(false) {
                break mesh;
            }
            std::thread::yield_now();
        };
        assert_eq!(mesh.solid_id(), fx.doc.item(fx.solid).unwrap().entity_id);
        assert!(s.get_result(false).is_none());
    }

    #[test]
    fn failed_jobs_are_accounted_for_but_not_delivered() {
        let options = MeshOptions::default();
        let (fx, mut s) = scheduler(Arc::new(Failing), &options);
        assert!(s.start_mesh(fx.part_shape, fx.solid, &options));
        assert!(s.get_result(true).is_none());
        assert_eq!(s.outstanding(), 0);
        assert_eq!(s.submitted(), 1);
    }

    #[test]
    fn queue_limit_and_degenerate_items_are_refused() {
        let options = MeshOptions {
            queue_limit: Some(1),
            ..MeshOptions::default()
        };
        let (fx, mut s) = scheduler(Arc::new(BrepTessellator), &options);
        assert!(!s.start_mesh(fx.part_shape, fx.curve, &options));
        assert!(s.start_mesh(fx.part_shape, fx.solid, &options));
        assert!(s.is_full());
        assert!(!s.start_mesh(fx.part_shape, fx.solid, &options));
        assert_eq!(s.submitted(), 1);
        assert!(s.get_result(true).is_some());
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = MeshOptions {
            min_segments: 0,
            ..MeshOptions::default()
        };
        let doc = Arc::new(Document::new());
        assert!(MeshScheduler::new(doc, Arc::new(BrepTessellator), &options).is_err());
    }
}
