use cucumber::given;

use crate::cucumber::{world::OrderSystem, OrderWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut OrderWorld) {
    let system = OrderSystem::new().await;
    world.system = Some(system);
}
