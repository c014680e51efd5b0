use geom_engine::{GeometryEngine, SolidHandle};
use tracing::warn;

/// Solids created during one scoped run.
///
/// Temporaries are deleted when the run ends; outputs survive a successful run
/// and are deleted when it fails. Handles already consumed by a boolean are skipped.
#[derive(Debug, Default)]
pub struct Scratch {
    temps: Vec<SolidHandle>,
    outputs: Vec<SolidHandle>,
}

impl Scratch {
    pub fn temp(&mut self, handle: SolidHandle) -> SolidHandle {
        self.temps.push(handle);
        handle
    }

    pub fn output(&mut self, handle: SolidHandle) -> SolidHandle {
        self.outputs.push(handle);
        handle
    }

    fn release(self, engine: &mut dyn GeometryEngine, failed: bool) {
        let doomed = if failed {
            self.temps.into_iter().chain(self.outputs).collect::<Vec<_>>()
        } else {
            self.temps
        };
        for handle in doomed {
            if engine.contains(handle) {
                if let Err(e) = engine.delete(handle) {
                    warn!(%handle, error = %e, "failed to delete scratch solid");
                }
            }
        }
    }
}

/// Run `body` with a fresh [`Scratch`], cleaning up on every exit path.
pub fn run_scoped<T, E>(
    engine: &mut dyn GeometryEngine,
    body: impl FnOnce(&mut dyn GeometryEngine, &mut Scratch) -> Result<T, E>,
) -> Result<T, E> {
    let mut scratch = Scratch::default();
    let result = body(&mut *engine, &mut scratch);
    scratch.release(engine, result.is_err());
    result
}
