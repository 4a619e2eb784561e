//! Throw Aim demo harness
//!
//! Drives one thrower through a scripted stick sequence in a small SDF arena,
//! throws twice and reports where the projectiles came down.
//!
//! Usage: `throw-aim [tuning.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::path::PathBuf;

    use glam::{Vec2, Vec3};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use throw_aim::AimTuning;
    use throw_aim::consts::{MAX_SUBSTEPS, SIM_DT};
    use throw_aim::sim::{
        AimEvent, AimSolver, AimState, EntityId, LAYER_PAWNS, LockCommand, MASK_AIM_TRACE, Projectile, SdfWorld,
        Shape, ThrowerPose, TickInput, WorldEntity, ground_reticle,
    };

    const THROWER: EntityId = EntityId(1);
    /// Script length in fixed ticks
    const SCRIPT_TICKS: u32 = 600;
    /// Ticks at which the script throws
    const THROW_TICKS: [u32; 2] = [240, 480];
    const LOCK_TICK: u32 = 300;

    pub struct Demo {
        solver: AimSolver,
        state: AimState,
        pose: ThrowerPose,
        world: SdfWorld,
        projectiles: Vec<Projectile>,
        rng: Pcg32,
        accumulator: f32,
        clock: f32,
        tick_index: u32,
    }

    impl Demo {
        pub fn new(tuning: AimTuning, seed: u64) -> Self {
            Self {
                solver: AimSolver::new(tuning),
                state: AimState::new(),
                pose: ThrowerPose {
                    id: THROWER,
                    position: Vec3::ZERO,
                    forward: Vec3::X,
                    capsule_center: Some(Vec3::new(0.0, 0.0, 90.0)),
                    throw_socket: Some(Vec3::new(20.0, 30.0, 150.0)),
                },
                world: build_arena(),
                projectiles: Vec::new(),
                rng: Pcg32::seed_from_u64(seed),
                accumulator: 0.0,
                clock: 0.0,
                tick_index: 0,
            }
        }

        pub fn finished(&self) -> bool {
            self.tick_index >= SCRIPT_TICKS && self.projectiles.iter().all(Projectile::is_landed)
        }

        /// Stick deflection for a script tick, with a little seeded jitter
        fn scripted_input(&mut self, tick: u32) -> TickInput {
            let jitter = Vec2::new(self.rng.random_range(-0.03..0.03), self.rng.random_range(-0.03..0.03));
            let stick = match tick {
                // Push forward into the wall
                0..120 => Vec2::new(0.0, 1.0),
                // Swing right toward the ledge
                120..240 => Vec2::new(0.8, 0.4),
                // Let go
                240..300 => Vec2::ZERO,
                // Pull back lightly
                300..360 => Vec2::new(-0.12, -0.18),
                // Sweep left at half deflection
                360..SCRIPT_TICKS => Vec2::new(-0.45, 0.1),
                _ => Vec2::ZERO,
            };
            let stick = if stick == Vec2::ZERO { stick } else { stick + jitter };
            TickInput {
                stick,
                view_yaw: Some(0.0),
                lock: (tick == LOCK_TICK).then_some(LockCommand::Toggle),
            }
        }

        /// Advance by one rendered frame of length `dt`
        pub fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.step();
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
        }

        fn step(&mut self) {
            self.clock += SIM_DT;

            if self.tick_index < SCRIPT_TICKS {
                let input = self.scripted_input(self.tick_index);
                let events = self.solver.update(&mut self.state, &self.pose, &input, SIM_DT, &self.world);
                for event in events {
                    match event {
                        AimEvent::SolutionUpdated(_) => {}
                        other => log::info!("tick {}: {:?}", self.tick_index, other),
                    }
                }

                if THROW_TICKS.contains(&self.tick_index) {
                    self.throw();
                }
            }

            for projectile in &mut self.projectiles {
                if projectile.advance(self.clock, &self.world).is_some() {
                    log::info!("{:?} landed at {}", projectile.id, projectile.position());
                }
                self.world.set_entity_position(projectile.id, projectile.position());
            }

            self.tick_index += 1;
        }

        fn throw(&mut self) {
            let query = self.world.clone();
            match self
                .solver
                .throw(&mut self.state, &self.pose, &query, &mut self.world, self.clock)
            {
                Ok(projectile) => self.projectiles.push(projectile),
                Err(err) => log::warn!("Throw failed: {err}"),
            }
        }

        /// Print the cached throw, its ground footprint and the landings
        pub fn report(&self) {
            let tuning = &self.solver.tuning;
            println!("range: {:.1}", self.state.effective_range);
            println!("locked: {:?}, soft: {:?}", self.state.locked_target, self.state.soft_lock_target);

            if let Some(solution) = &self.state.last_solution {
                match serde_json::to_string_pretty(solution) {
                    Ok(json) => println!("solution: {json}"),
                    Err(err) => log::warn!("Failed to serialize solution: {err}"),
                }
                let reticle = ground_reticle(
                    &self.world,
                    solution,
                    tuning.reticle_sample_count,
                    tuning.reticle_trace_height,
                    MASK_AIM_TRACE,
                    &[THROWER],
                );
                println!("reticle: {} points", reticle.len());
            }

            for projectile in &self.projectiles {
                println!("{:?}: {:?}", projectile.id, projectile.phase());
            }
        }
    }

    /// Ground, a wall ahead, a ledge to the right and two lockable dummies
    fn build_arena() -> SdfWorld {
        let mut world = SdfWorld::with_ground(0.0);
        world.add_shape(Shape::Box {
            center: Vec3::new(900.0, 0.0, 200.0),
            half_extents: Vec3::new(40.0, 400.0, 200.0),
        });
        world.add_shape(Shape::Box {
            center: Vec3::new(600.0, 900.0, 100.0),
            half_extents: Vec3::new(300.0, 300.0, 100.0),
        });
        for (id, position, priority) in [
            (10, Vec3::new(700.0, -300.0, 0.0), 1.0),
            (11, Vec3::new(-500.0, 600.0, 0.0), 2.0),
        ] {
            world.add_entity(WorldEntity {
                id: EntityId(id),
                position,
                radius: 40.0,
                layer: LAYER_PAWNS,
                lock_priority: Some(priority),
            });
        }
        world
    }

    /// Parse `[tuning.json] [seed]`
    pub fn parse_args() -> (Option<PathBuf>, u64) {
        let mut args = std::env::args().skip(1);
        let path = args.next().map(PathBuf::from);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
        (path, seed)
    }

    pub fn run() {
        let (path, seed) = parse_args();
        let tuning = match path {
            Some(path) => AimTuning::load_or_default(&path),
            None => AimTuning::default(),
        };
        if let Err(err) = tuning.validate() {
            log::error!("Invalid tuning: {err}");
            return;
        }

        log::info!("Running throw demo with seed: {}", seed);
        let mut demo = Demo::new(tuning, seed);
        let mut frame_rng = Pcg32::seed_from_u64(seed ^ 0x5eed);

        // Uneven frame times exercise the fixed-step accumulator
        let mut frames = 0;
        while !demo.finished() && frames < 10_000 {
            demo.update(frame_rng.random_range(0.008..0.034));
            frames += 1;
        }

        demo.report();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Throw Aim (native) starting...");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {}
