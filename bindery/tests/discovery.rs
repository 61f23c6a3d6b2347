//! Providers announced with `inventory::submit!` and picked up at build time.

use std::sync::Arc;

use bindery::{Component, Container, Provider, ProviderRegistration, Registrations, bind};

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

trait Scheduler: Send + Sync {
    fn next_run(&self) -> u64;
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        1_000
    }
}

#[derive(Component)]
struct IntervalScheduler {
    #[inject]
    clock: Arc<dyn Clock>,
}

impl Scheduler for IntervalScheduler {
    fn next_run(&self) -> u64 {
        self.clock.now() + 60
    }
}

struct TimeProvider;

impl Provider for TimeProvider {
    fn register(&self, registrations: &mut Registrations) {
        registrations.value::<dyn Clock>(Arc::new(FixedClock));
    }
}

struct SchedulingProvider;

impl Provider for SchedulingProvider {
    fn register(&self, registrations: &mut Registrations) {
        bind!(registrations, dyn Scheduler => IntervalScheduler);
    }
}

bindery::inventory::submit! { ProviderRegistration::new(&TimeProvider) }
bindery::inventory::submit! { ProviderRegistration::new(&SchedulingProvider) }

#[test]
fn discovered_providers_wire_the_graph() {
    let container = Container::builder().discover_providers().build().unwrap();

    assert!(container.contains::<dyn Clock>());
    let scheduler = container.resolve::<dyn Scheduler>().unwrap();
    assert_eq!(scheduler.next_run(), 1_060);
}

#[test]
fn explicit_providers_work_without_discovery() {
    let container = Container::builder()
        .add_provider(&TimeProvider)
        .add_provider(&SchedulingProvider)
        .build()
        .unwrap();

    assert_eq!(container.len(), 2);
    assert_eq!(container.resolve::<dyn Clock>().unwrap().now(), 1_000);
}
