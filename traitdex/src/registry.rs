//! Load-time registration of data units.
//!
//! Loading a unit hands its implementors to the bound registrar, or buffers them until a
//! registrar binds. Binding drains the buffer into the new registrar in load order.
use crate::unit::{DataUnit, LoadedImplementors};
use parking_lot::{Mutex, ReentrantMutex};
use rayon::prelude::*;
use std::{cell::RefCell, collections::VecDeque, fmt, mem, sync::Arc};
use traitdex_error::UnitError;

/// Consumes implementor mappings once they are available.
pub trait Registrar {
    fn register_implementors(&mut self, implementors: LoadedImplementors);
}

impl<F> Registrar for F
where
    F: FnMut(LoadedImplementors),
{
    fn register_implementors(&mut self, implementors: LoadedImplementors) {
        self(implementors)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrarState {
    Bound,
    Unbound,
}

impl RegistrarState {
    fn of<T>(registrar: &Option<T>) -> Self {
        match registrar {
            Some(_) => RegistrarState::Bound,
            None => RegistrarState::Unbound,
        }
    }
}

/// The process-wide state a data unit registers itself against.
pub trait RegistrationContext {
    /// Hands `implementors` to the bound registrar, or gives them back when none is bound.
    fn try_register(
        &mut self,
        implementors: LoadedImplementors,
    ) -> Result<(), LoadedImplementors>;

    /// Appends `implementors` to the pending buffer.
    fn buffer_pending(&mut self, implementors: LoadedImplementors);
}

/// Runs one unit's registration shim: register if a registrar is bound, buffer otherwise.
///
/// Returns the state the unit found the context in. The shim itself never binds.
pub fn on_load<C>(context: &mut C, implementors: LoadedImplementors) -> RegistrarState
where
    C: RegistrationContext + ?Sized,
{
    match context.try_register(implementors) {
        Ok(()) => RegistrarState::Bound,
        Err(implementors) => {
            tracing::trace!("no registrar bound, buffering {}", implementors.trait_path);
            context.buffer_pending(implementors);
            RegistrarState::Unbound
        }
    }
}

/// Loads `units` one after the other, in the given order.
///
/// Every unit is evaluated before any is loaded, so a malformed unit loads nothing.
pub fn load_units<C>(
    context: &mut C,
    units: &[DataUnit],
) -> Result<Vec<RegistrarState>, UnitError>
where
    C: RegistrationContext + ?Sized,
{
    let loaded = units
        .iter()
        .map(DataUnit::evaluate)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(loaded
        .into_iter()
        .map(|implementors| on_load(context, implementors))
        .collect())
}

pub type BoxedRegistrar = Box<dyn Registrar>;

/// Single-threaded registration context.
#[derive(Default)]
pub struct RegistryContext {
    registrar: Option<BoxedRegistrar>,
    pending: VecDeque<LoadedImplementors>,
}

impl RegistryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrar_state(&self) -> RegistrarState {
        RegistrarState::of(&self.registrar)
    }

    /// Payloads loaded while no registrar was bound, in load order.
    pub fn pending_implementors(&self) -> &VecDeque<LoadedImplementors> {
        &self.pending
    }

    /// Binds `registrar` and replays the pending buffer to it in load order, leaving the
    /// buffer empty. Returns the previously bound registrar.
    ///
    /// A payload leaves the buffer only when it is handed over, so if the registrar panics
    /// the payloads it never received stay pending.
    pub fn bind<R>(&mut self, registrar: R) -> Option<BoxedRegistrar>
    where
        R: Registrar + 'static,
    {
        let previous = self.registrar.take();
        let registrar = self.registrar.insert(Box::new(registrar));
        tracing::debug!("registrar bound, draining {} pending units", self.pending.len());
        while let Some(implementors) = self.pending.pop_front() {
            registrar.register_implementors(implementors);
        }
        previous
    }

    /// Unbinds the registrar; later loads buffer again.
    pub fn unbind(&mut self) -> Option<BoxedRegistrar> {
        self.registrar.take()
    }

    /// Evaluates and loads a single unit.
    pub fn load(&mut self, unit: &DataUnit) -> Result<RegistrarState, UnitError> {
        let implementors = unit.evaluate()?;
        Ok(on_load(self, implementors))
    }
}

impl RegistrationContext for RegistryContext {
    fn try_register(
        &mut self,
        implementors: LoadedImplementors,
    ) -> Result<(), LoadedImplementors> {
        match self.registrar.as_mut() {
            Some(registrar) => {
                registrar.register_implementors(implementors);
                Ok(())
            }
            None => Err(implementors),
        }
    }

    fn buffer_pending(&mut self, implementors: LoadedImplementors) {
        self.pending.push_back(implementors);
    }
}

impl fmt::Debug for RegistryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryContext")
            .field("registrar", &self.registrar_state())
            .field("pending", &self.pending)
            .finish()
    }
}

/// A bound registrar of a [SharedRegistryContext] and the payloads queued for it.
///
/// Payloads handed over while the registrar is already running on the same thread are queued
/// and delivered by the outer call once the registrar returns.
struct Delivery {
    registrar: RefCell<Box<dyn Registrar + Send>>,
    queue: RefCell<VecDeque<LoadedImplementors>>,
}

type SharedDelivery = Arc<ReentrantMutex<Delivery>>;

impl Delivery {
    fn deliver(&self, implementors: impl IntoIterator<Item = LoadedImplementors>) {
        self.queue.borrow_mut().extend(implementors);
        let Ok(mut registrar) = self.registrar.try_borrow_mut() else {
            return;
        };
        loop {
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(implementors) => registrar.register_implementors(implementors),
                None => break,
            }
        }
    }
}

#[derive(Default)]
struct SharedState {
    registrar: Option<SharedDelivery>,
    pending: VecDeque<LoadedImplementors>,
}

/// A registration context shared between threads loading units concurrently.
///
/// Whether a payload is buffered or delivered is decided under one lock guarding the bound
/// registrar and the pending buffer together, so no payload is lost or delivered twice. The
/// registrar itself runs outside that lock and may call back into the context.
#[derive(Clone, Default)]
pub struct SharedRegistryContext(Arc<Mutex<SharedState>>);

impl SharedRegistryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrar_state(&self) -> RegistrarState {
        RegistrarState::of(&self.0.lock().registrar)
    }

    pub fn on_load(&self, implementors: LoadedImplementors) -> RegistrarState {
        let delivery = {
            let mut state = self.0.lock();
            match state.registrar.clone() {
                Some(delivery) => delivery,
                None => {
                    tracing::trace!("no registrar bound, buffering {}", implementors.trait_path);
                    state.pending.push_back(implementors);
                    return RegistrarState::Unbound;
                }
            }
        };
        delivery.lock().deliver([implementors]);
        RegistrarState::Bound
    }

    /// Binds `registrar` and replays the pending buffer to it in load order. Loads racing
    /// with the bind reach the registrar only after the replay. Returns the state found.
    pub fn bind<R>(&self, registrar: R) -> RegistrarState
    where
        R: Registrar + Send + 'static,
    {
        let delivery: SharedDelivery = Arc::new(ReentrantMutex::new(Delivery {
            registrar: RefCell::new(Box::new(registrar)),
            queue: RefCell::default(),
        }));
        let replay = delivery.lock();
        let (previous, pending) = {
            let mut state = self.0.lock();
            let previous = state.registrar.replace(delivery.clone());
            (previous, mem::take(&mut state.pending))
        };
        tracing::debug!("registrar bound, draining {} pending units", pending.len());
        replay.deliver(pending);
        RegistrarState::of(&previous)
    }

    /// Unbinds the registrar; later loads buffer again. Returns the state found.
    ///
    /// Payloads queued for the registrar but never delivered, because it panicked or because
    /// it unbound itself mid-delivery, are loaded again against the unbound context.
    pub fn unbind(&self) -> RegistrarState {
        let Some(delivery) = self.0.lock().registrar.take() else {
            return RegistrarState::Unbound;
        };
        let undelivered = mem::take(&mut *delivery.lock().queue.borrow_mut());
        for implementors in undelivered {
            self.on_load(implementors);
        }
        RegistrarState::Bound
    }

    /// Removes and returns the pending buffer.
    pub fn take_pending(&self) -> Vec<LoadedImplementors> {
        mem::take(&mut self.0.lock().pending).into()
    }

    /// Loads `units` concurrently. Load order between units is unspecified.
    pub fn load_units_parallel(&self, units: &[DataUnit]) -> Result<(), UnitError> {
        let loaded = units
            .par_iter()
            .map(DataUnit::evaluate)
            .collect::<Result<Vec<_>, _>>()?;
        loaded.into_par_iter().for_each(|implementors| {
            self.on_load(implementors);
        });
        Ok(())
    }
}

impl fmt::Debug for SharedRegistryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.lock();
        f.debug_struct("SharedRegistryContext")
            .field("registrar", &RegistrarState::of(&state.registrar))
            .field("pending", &state.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{corpus::Corpus, emit::emit_all, index::TraitImplementorIndex};
    use pretty_assertions::assert_eq;
    use std::{
        collections::BTreeSet,
        panic::{self, AssertUnwindSafe},
        rc::Rc,
        sync::mpsc,
        time::Duration,
    };
    use traitdex_types::TraitPath;

    fn units(count: usize) -> Vec<DataUnit> {
        let mut corpus = Corpus::new(["libbar", "libfoo"]);
        for n in 0..count {
            let descriptor = format!("impl Trait{n} for X{n}");
            corpus = corpus.with_trait(
                &format!("pkgA::Trait{n}"),
                &[("libfoo", descriptor.as_str())],
            );
        }
        emit_all(&TraitImplementorIndex::build(&corpus).unwrap())
    }

    fn payloads(units: &[DataUnit]) -> Vec<LoadedImplementors> {
        units.iter().map(|unit| unit.evaluate().unwrap()).collect()
    }

    /// A registrar recording every call into a shared log.
    fn recorder() -> (
        Arc<Mutex<Vec<LoadedImplementors>>>,
        impl Registrar + Send + 'static,
    ) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        (log, move |implementors: LoadedImplementors| {
            sink.lock().push(implementors)
        })
    }

    #[test]
    fn unbound_loads_are_buffered_in_order() {
        let units = units(5);
        let mut context = RegistryContext::new();
        let states = load_units(&mut context, &units).unwrap();
        assert_eq!(states, vec![RegistrarState::Unbound; 5]);
        assert_eq!(*context.pending_implementors(), payloads(&units));
    }

    #[test]
    fn bound_registrar_is_called_once_per_unit() {
        let units = units(4);
        let (log, registrar) = recorder();
        let mut context = RegistryContext::new();
        assert!(context.bind(registrar).is_none());

        let states = load_units(&mut context, &units).unwrap();
        assert_eq!(states, vec![RegistrarState::Bound; 4]);
        assert!(context.pending_implementors().is_empty());
        assert_eq!(*log.lock(), payloads(&units));
    }

    #[test]
    fn binding_drains_pending_in_load_order() {
        let units = units(6);
        let (log, registrar) = recorder();
        let mut context = RegistryContext::new();

        load_units(&mut context, &units[..3]).unwrap();
        assert_eq!(context.pending_implementors().len(), 3);
        context.bind(registrar);
        assert!(context.pending_implementors().is_empty());
        assert_eq!(context.registrar_state(), RegistrarState::Bound);
        load_units(&mut context, &units[3..]).unwrap();

        assert_eq!(*log.lock(), payloads(&units));
    }

    #[test]
    fn rebinding_returns_previous_registrar() {
        let units = units(2);
        let (first_log, first) = recorder();
        let (second_log, second) = recorder();
        let mut context = RegistryContext::new();

        context.bind(first);
        context.load(&units[0]).unwrap();
        assert!(context.bind(second).is_some());
        context.load(&units[1]).unwrap();

        assert_eq!(*first_log.lock(), payloads(&units[..1]));
        assert_eq!(*second_log.lock(), payloads(&units[1..]));

        assert!(context.unbind().is_some());
        assert_eq!(context.load(&units[0]).unwrap(), RegistrarState::Unbound);
        assert_eq!(context.pending_implementors().len(), 1);
    }

    #[test]
    fn malformed_unit_loads_nothing() {
        let mut units = units(2);
        units.push(DataUnit::new(
            "pkgA::Broken".parse().unwrap(),
            "garbage".to_owned(),
        ));
        let mut context = RegistryContext::new();
        assert!(load_units(&mut context, &units).is_err());
        assert!(context.pending_implementors().is_empty());
    }

    #[test]
    fn concurrent_loads_are_neither_lost_nor_duplicated() {
        const UNITS: usize = 64;
        let units = units(UNITS);
        let (log, registrar) = recorder();
        let context = SharedRegistryContext::new();

        std::thread::scope(|scope| {
            let loader = context.clone();
            let units = &units;
            scope.spawn(move || loader.load_units_parallel(units).unwrap());
            let binder = context.clone();
            scope.spawn(move || {
                binder.bind(registrar);
            });
        });

        assert_eq!(context.registrar_state(), RegistrarState::Bound);
        assert!(context.take_pending().is_empty());
        let registered = log.lock();
        assert_eq!(registered.len(), UNITS);
        let distinct: BTreeSet<&TraitPath> =
            registered.iter().map(|loaded| &loaded.trait_path).collect();
        assert_eq!(distinct.len(), UNITS);
    }

    #[test]
    fn shared_context_buffers_until_bound() {
        let units = units(3);
        let context = SharedRegistryContext::new();
        context.load_units_parallel(&units).unwrap();
        let mut pending = context.take_pending();
        pending.sort_by(|a, b| a.trait_path.cmp(&b.trait_path));
        assert_eq!(pending, payloads(&units));
        assert_eq!(context.registrar_state(), RegistrarState::Unbound);
        assert_eq!(context.unbind(), RegistrarState::Unbound);
    }

    #[test]
    fn failed_drain_keeps_undelivered_payloads() {
        let units = units(3);
        let mut context = RegistryContext::new();
        load_units(&mut context, &units).unwrap();

        let failed = panic::catch_unwind(AssertUnwindSafe(|| {
            context.bind(|_: LoadedImplementors| panic!("registrar failed"));
        }));
        assert!(failed.is_err());
        assert!(context.unbind().is_some());
        assert_eq!(*context.pending_implementors(), payloads(&units[1..]));

        let (log, registrar) = recorder();
        context.bind(registrar);
        assert!(context.pending_implementors().is_empty());
        assert_eq!(*log.lock(), payloads(&units[1..]));
    }

    #[test]
    fn shared_failed_drain_keeps_undelivered_payloads() {
        let payloads = payloads(&units(3));
        let context = SharedRegistryContext::new();
        for implementors in &payloads {
            context.on_load(implementors.clone());
        }

        let failed = panic::catch_unwind(AssertUnwindSafe(|| {
            context.bind(|_: LoadedImplementors| panic!("registrar failed"));
        }));
        assert!(failed.is_err());
        assert_eq!(context.unbind(), RegistrarState::Bound);
        assert_eq!(context.take_pending(), payloads[1..].to_vec());
    }

    #[test]
    fn registrar_may_call_back_into_the_shared_context() {
        let payloads = payloads(&units(3));
        let context = SharedRegistryContext::new();
        context.on_load(payloads[0].clone());

        let (log, mut record) = recorder();
        let inner = context.clone();
        let mut dependents = VecDeque::from([payloads[2].clone()]);
        let registrar = move |implementors: LoadedImplementors| {
            assert_eq!(inner.registrar_state(), RegistrarState::Bound);
            if let Some(dependent) = dependents.pop_front() {
                assert_eq!(inner.on_load(dependent), RegistrarState::Bound);
            }
            record.register_implementors(implementors);
        };

        let (done, finished) = mpsc::channel();
        let loader = context.clone();
        let last = payloads[1].clone();
        std::thread::spawn(move || {
            loader.bind(registrar);
            loader.on_load(last);
            done.send(()).unwrap();
        });
        finished
            .recv_timeout(Duration::from_secs(10))
            .expect("registrar calling back into the context never returned");

        assert_eq!(
            *log.lock(),
            vec![payloads[0].clone(), payloads[2].clone(), payloads[1].clone()]
        );
    }

    #[test]
    fn single_threaded_context_accepts_local_registrars() {
        let units = units(2);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let mut context = RegistryContext::new();

        context.load(&units[0]).unwrap();
        context.bind(move |implementors: LoadedImplementors| sink.borrow_mut().push(implementors));
        context.load(&units[1]).unwrap();
        assert_eq!(*log.borrow(), payloads(&units));
    }
}
