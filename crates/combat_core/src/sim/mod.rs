mod clock;
mod events;
mod intents;
mod session;
mod spatial;
mod world;

pub use clock::{Clock, FixedStepClock, ManualClock};
pub use events::{CombatEvent, CombatEventKind, CombatObserver, EventBus, EventCounts};
pub use intents::{CombatIntent, CombatIntentKind, IntentApplyStats, IntentQueue, WeaponId};
pub use session::{CombatSession, TickSystemId, TICK_SYSTEM_ORDER};
pub use spatial::{RayHit, SpatialQuery, SphereQuery};
pub use world::{horizontal_distance, Actor, ActorId, ActorKind, Team, World};
