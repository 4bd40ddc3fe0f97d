//! Per-frame game state update.
//!
//! One tick: sample the pointer, step the state machine, slave the ball's
//! height to the beat schedule, integrate and bounce its horizontal motion,
//! then write the results into the scene nodes for the next traversal.
//! Audio is driven by the returned command, never called from here.

use beatbounce_core::vec3_to_glam;
use beatbounce_scene::SceneGraph;
use glam::Vec3;
use nalgebra::Vector3;

use crate::beat::{BeatSchedule, KeyframeAction};
use crate::input::PointerInput;
use crate::options::GameOptions;
use crate::scene_setup::SceneHandles;

pub const BALL_RADIUS: f64 = 3.0;
const BALL_SPEED: f64 = 60.0;

/// Playfield box: full dimensions and world position of its center.
const BOX_DIMENSIONS: [f64; 3] = [180.0, 90.0, 90.0];
const BOX_POSITION: [f64; 3] = [0.0, -10.0, -80.0];
const PAD_DIMENSIONS: [f64; 3] = [30.0, 3.0, 40.0];

/// Extra inset on the near wall so the ball stays clear of the camera.
const CAMERA_WALL_OFFSET: f64 = 30.0;

/// Game state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the first click; the ball previews the pad position.
    NotStarted,
    Playing,
    Paused,
    Lost,
}

/// Audio transport edge emitted by a tick. The app applies it to the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MusicCommand {
    /// Seek to the offset (seconds) and start.
    Play(f64),
    Pause,
    Resume,
    Stop,
}

/// Reachable extent of the ball's center inside the box.
#[derive(Debug, Clone, Copy)]
pub struct FieldBounds {
    pub ball_min_x: f64,
    pub ball_max_x: f64,
    pub ball_min_z: f64,
    pub ball_max_z: f64,
    pub ball_bottom_y: f64,
    pub ball_top_y: f64,
}

impl FieldBounds {
    fn new() -> Self {
        let [dim_x, dim_y, dim_z] = BOX_DIMENSIONS;
        let [box_x, box_y, box_z] = BOX_POSITION;
        Self {
            ball_min_x: box_x - dim_x / 2.0 + BALL_RADIUS,
            ball_max_x: box_x + dim_x / 2.0 - BALL_RADIUS,
            ball_min_z: box_z - dim_z / 2.0 + BALL_RADIUS,
            ball_max_z: box_z + dim_z / 2.0 - BALL_RADIUS - CAMERA_WALL_OFFSET,
            ball_bottom_y: box_y - dim_y / 2.0 + BALL_RADIUS + PAD_DIMENSIONS[1],
            ball_top_y: box_y + dim_y / 2.0 - BALL_RADIUS,
        }
    }
}

/// The whole game simulation: one instance per run.
pub struct Simulation {
    options: GameOptions,
    schedule: BeatSchedule,
    phase: Phase,
    bounds: FieldBounds,
    ball_position: Vector3<f64>,
    /// Per-axis travel sign; flipped on bounce, never renormalized.
    ball_direction: Vector3<f64>,
    pad_x: f64,
    pad_z: f64,
    /// Wall-clock time since start; keeps running while paused or lost.
    total_elapsed: f64,
    /// Game time driving the beat cursor; frozen outside Playing.
    game_elapsed: f64,
}

impl Simulation {
    pub fn new(options: GameOptions, schedule: BeatSchedule) -> Self {
        let start_offset = options.start_offset;
        Self {
            options,
            schedule,
            phase: Phase::NotStarted,
            bounds: FieldBounds::new(),
            ball_position: Vector3::new(
                0.0,
                BALL_RADIUS + PAD_DIMENSIONS[1],
                BOX_DIMENSIONS[2] / 2.0,
            ),
            ball_direction: Vector3::new(1.0, 1.0, 0.2),
            pad_x: 0.0,
            pad_z: 0.0,
            total_elapsed: start_offset,
            game_elapsed: start_offset,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bounds(&self) -> &FieldBounds {
        &self.bounds
    }

    pub fn ball_position(&self) -> &Vector3<f64> {
        &self.ball_position
    }

    /// Current pad axes, for the camera.
    pub fn pad_axes(&self) -> (f64, f64) {
        (self.pad_x, self.pad_z)
    }

    pub fn total_elapsed(&self) -> f64 {
        self.total_elapsed
    }

    pub fn game_elapsed(&self) -> f64 {
        self.game_elapsed
    }

    /// The pad's world-space footprint `(left, right, front, back)` for the
    /// current axes.
    pub fn pad_rectangle(&self) -> (f64, f64, f64, f64) {
        let [dim_x, _, dim_z] = BOX_DIMENSIONS;
        let [box_x, _, box_z] = BOX_POSITION;
        let left = box_x - dim_x / 2.0 + (1.0 - self.pad_x) * (dim_x - PAD_DIMENSIONS[0]);
        let front = box_z - dim_z / 2.0 + (1.0 - self.pad_z) * (dim_z - PAD_DIMENSIONS[2]);
        (
            left,
            left + PAD_DIMENSIONS[0],
            front,
            front + PAD_DIMENSIONS[2],
        )
    }

    /// Advance one frame and write the results into the scene nodes.
    /// Returns the audio transport edge for this tick, if any.
    pub fn tick(
        &mut self,
        dt: f64,
        input: &PointerInput,
        graph: &mut SceneGraph,
        handles: &SceneHandles,
    ) -> Option<MusicCommand> {
        let b = self.bounds;
        let mut command = None;

        // Pointer owns the pad; autoplay overwrites it below while playing.
        self.pad_x = input.pad_x;
        self.pad_z = input.pad_z;

        match self.phase {
            Phase::NotStarted => {
                if input.left_pressed() {
                    if self.options.enable_music {
                        command = Some(MusicCommand::Play(self.options.start_offset));
                    }
                    self.total_elapsed = self.options.start_offset;
                    self.game_elapsed = self.options.start_offset;
                    self.phase = Phase::Playing;
                }

                // Preview: the ball sits where it will land, driven by the pad.
                self.ball_position.x =
                    b.ball_min_x + (1.0 - self.pad_x) * (b.ball_max_x - b.ball_min_x);
                self.ball_position.y = b.ball_bottom_y;
                self.ball_position.z = b.ball_min_z
                    + (1.0 - self.pad_z) * ((b.ball_max_z + CAMERA_WALL_OFFSET) - b.ball_min_z);
            }
            Phase::Lost => {
                self.total_elapsed += dt;
                if input.left_released() {
                    self.phase = Phase::NotStarted;
                    self.schedule.reset();
                }
            }
            Phase::Paused => {
                self.total_elapsed += dt;
                if input.right_released() {
                    self.phase = Phase::Playing;
                    if self.options.enable_music {
                        command = Some(MusicCommand::Resume);
                    }
                }
            }
            Phase::Playing => {
                self.total_elapsed += dt;
                self.game_elapsed += dt;

                if input.right_released() {
                    // Pause takes effect next tick; this one still simulates.
                    self.phase = Phase::Paused;
                    if self.options.enable_music {
                        command = Some(MusicCommand::Pause);
                    }
                }

                let jumped = self.schedule.advance(self.game_elapsed);
                let segment = self.schedule.segment();
                let fraction = segment.fraction(self.game_elapsed);
                let travel = b.ball_top_y - b.ball_bottom_y;

                // The ball's height is dictated by the beat, never integrated.
                self.ball_position.y = match (segment.origin, segment.destination) {
                    (KeyframeAction::Bottom, KeyframeAction::Bottom) => b.ball_bottom_y,
                    (KeyframeAction::Top, KeyframeAction::Top) => b.ball_top_y,
                    (_, KeyframeAction::Bottom) => b.ball_bottom_y + travel * (1.0 - fraction),
                    (_, KeyframeAction::Top) => b.ball_bottom_y + travel * fraction,
                };

                self.ball_position.x += dt * BALL_SPEED * self.ball_direction.x;
                self.ball_position.z += dt * BALL_SPEED * self.ball_direction.z;

                // Elastic bounce: clamp to the wall and flip the sign.
                if self.ball_position.x < b.ball_min_x {
                    self.ball_position.x = b.ball_min_x;
                    self.ball_direction.x = -self.ball_direction.x;
                } else if self.ball_position.x > b.ball_max_x {
                    self.ball_position.x = b.ball_max_x;
                    self.ball_direction.x = -self.ball_direction.x;
                }
                if self.ball_position.z < b.ball_min_z {
                    self.ball_position.z = b.ball_min_z;
                    self.ball_direction.z = -self.ball_direction.z;
                } else if self.ball_position.z > b.ball_max_z {
                    self.ball_position.z = b.ball_max_z;
                    self.ball_direction.z = -self.ball_direction.z;
                }

                if self.options.enable_autoplay {
                    self.pad_x = 1.0
                        - (self.ball_position.x - b.ball_min_x) / (b.ball_max_x - b.ball_min_x);
                    self.pad_z = 1.0
                        - (self.ball_position.z - b.ball_min_z)
                            / ((b.ball_max_z + CAMERA_WALL_OFFSET) - b.ball_min_z);
                }

                // The ball lands exactly when a bottom→top segment begins; if
                // the pad isn't under it at that instant, the game is over.
                if jumped
                    && segment.origin == KeyframeAction::Bottom
                    && segment.destination == KeyframeAction::Top
                {
                    let (left, right, front, back) = self.pad_rectangle();
                    if self.ball_position.x < left
                        || self.ball_position.x > right
                        || self.ball_position.z < front
                        || self.ball_position.z > back
                    {
                        self.phase = Phase::Lost;
                        if self.options.enable_music {
                            command = Some(MusicCommand::Stop);
                        }
                    }
                }
            }
        }

        self.apply_to_scene(graph, handles);
        command
    }

    /// Write this tick's results into the scene nodes.
    fn apply_to_scene(&self, graph: &mut SceneGraph, handles: &SceneHandles) {
        let [dim_x, dim_y, dim_z] = BOX_DIMENSIONS;
        let box_position = Vec3::new(
            BOX_POSITION[0] as f32,
            BOX_POSITION[1] as f32,
            BOX_POSITION[2] as f32,
        );

        graph.node_mut(handles.box_node).position = box_position;

        let ball = graph.node_mut(handles.ball);
        ball.position = vec3_to_glam(&self.ball_position);
        ball.scale = Vec3::splat(BALL_RADIUS as f32);
        ball.rotation = Vec3::new(0.0, (self.total_elapsed * 2.0) as f32, 0.0);

        let pad = graph.node_mut(handles.pad);
        pad.position = Vec3::new(
            (BOX_POSITION[0] - dim_x / 2.0
                + PAD_DIMENSIONS[0] / 2.0
                + (1.0 - self.pad_x) * (dim_x - PAD_DIMENSIONS[0])) as f32,
            (BOX_POSITION[1] - dim_y / 2.0 + PAD_DIMENSIONS[1] / 2.0) as f32,
            (BOX_POSITION[2] - dim_z / 2.0
                + PAD_DIMENSIONS[2] / 2.0
                + (1.0 - self.pad_z) * (dim_z - PAD_DIMENSIONS[2])) as f32,
        );
    }

    /// Box and pad full dimensions, for mesh generation.
    pub fn box_dimensions() -> Vec3 {
        Vec3::new(
            BOX_DIMENSIONS[0] as f32,
            BOX_DIMENSIONS[1] as f32,
            BOX_DIMENSIONS[2] as f32,
        )
    }

    pub fn pad_dimensions() -> Vec3 {
        Vec3::new(
            PAD_DIMENSIONS[0] as f32,
            PAD_DIMENSIONS[1] as f32,
            PAD_DIMENSIONS[2] as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_setup::build_scene;
    use KeyframeAction::{Bottom, Top};

    struct Rig {
        sim: Simulation,
        input: PointerInput,
        graph: SceneGraph,
        handles: SceneHandles,
    }

    impl Rig {
        fn new(options: GameOptions, entries: Vec<(f64, KeyframeAction)>) -> Self {
            let mut graph = SceneGraph::new();
            let handles = build_scene(&mut graph);
            Self {
                sim: Simulation::new(options, BeatSchedule::new(entries)),
                input: PointerInput::new(),
                graph,
                handles,
            }
        }

        fn tick(&mut self, dt: f64) -> Option<MusicCommand> {
            self.sim.tick(dt, &self.input, &mut self.graph, &self.handles)
        }

        fn start(&mut self) {
            self.input.update_buttons(true, false);
            self.tick(0.0);
            self.input.update_buttons(false, false);
            self.tick(0.0);
        }
    }

    fn bounce_schedule() -> Vec<(f64, KeyframeAction)> {
        vec![(0.0, Bottom), (1.0, Bottom), (2.0, Top), (3.0, Bottom)]
    }

    #[test]
    fn test_left_press_starts_the_game() {
        let mut rig = Rig::new(GameOptions::default(), bounce_schedule());
        assert_eq!(rig.sim.phase(), Phase::NotStarted);

        rig.input.update_buttons(true, false);
        let command = rig.tick(0.25);
        assert_eq!(rig.sim.phase(), Phase::Playing);
        assert_eq!(command, Some(MusicCommand::Play(0.0)));
        assert_eq!(rig.sim.total_elapsed(), 0.0);
        assert_eq!(rig.sim.game_elapsed(), 0.0);
    }

    #[test]
    fn test_start_honors_start_offset() {
        let options = GameOptions {
            start_offset: 30.0,
            ..GameOptions::default()
        };
        let mut rig = Rig::new(options, vec![(0.0, Bottom), (100.0, Bottom)]);
        rig.input.update_buttons(true, false);
        let command = rig.tick(0.0);
        assert_eq!(command, Some(MusicCommand::Play(30.0)));
        assert_eq!(rig.sim.game_elapsed(), 30.0);
    }

    #[test]
    fn test_no_music_means_no_commands() {
        let options = GameOptions {
            enable_music: false,
            ..GameOptions::default()
        };
        let mut rig = Rig::new(options, bounce_schedule());
        rig.input.update_buttons(true, false);
        assert_eq!(rig.tick(0.0), None);
        assert_eq!(rig.sim.phase(), Phase::Playing);
    }

    #[test]
    fn test_ball_y_interpolates_bottom_to_top() {
        let mut rig = Rig::new(GameOptions::default(), vec![(0.0, Bottom), (8.0, Top)]);
        rig.sim.ball_direction = Vector3::zeros();
        rig.start();

        let b = *rig.sim.bounds();
        let travel = b.ball_top_y - b.ball_bottom_y;

        rig.tick(0.0);
        assert!((rig.sim.ball_position().y - b.ball_bottom_y).abs() < 1e-9);

        rig.tick(4.0);
        assert!((rig.sim.ball_position().y - (b.ball_bottom_y + travel * 0.5)).abs() < 1e-9);

        rig.tick(3.999);
        let expected = b.ball_bottom_y + travel * (7.999 / 8.0);
        assert!((rig.sim.ball_position().y - expected).abs() < 1e-6);
    }

    #[test]
    fn test_ball_holds_at_top_between_top_keyframes() {
        let mut rig = Rig::new(
            GameOptions::default(),
            vec![(0.0, Bottom), (1.0, Top), (5.0, Top)],
        );
        rig.sim.ball_direction = Vector3::zeros();
        rig.start();
        rig.tick(2.0);
        assert!((rig.sim.ball_position().y - rig.sim.bounds().ball_top_y).abs() < 1e-9);
    }

    #[test]
    fn test_bounce_clamps_and_flips_direction() {
        let mut rig = Rig::new(GameOptions::default(), vec![(0.0, Bottom), (1e4, Bottom)]);
        rig.start();

        let max_x = rig.sim.bounds().ball_max_x;
        rig.sim.ball_position.x = max_x - 1.0;
        rig.sim.ball_direction = Vector3::new(1.0, 1.0, 0.0);

        rig.tick(0.5); // would travel 30 units past the wall
        assert_eq!(rig.sim.ball_position().x, max_x);
        assert_eq!(rig.sim.ball_direction.x, -1.0);

        // Next tick moves away from the wall, no second flip.
        rig.tick(0.1);
        assert!(rig.sim.ball_position().x < max_x);
        assert_eq!(rig.sim.ball_direction.x, -1.0);
    }

    #[test]
    fn test_loss_when_ball_misses_the_pad() {
        let mut rig = Rig::new(GameOptions::default(), bounce_schedule());
        rig.start();

        // Park the ball dead center, far from the pad-axes-(0,0) rectangle,
        // and step across the 1.0 s boundary into the bottom→top segment.
        rig.sim.ball_direction = Vector3::zeros();
        rig.sim.ball_position.x = 0.0;
        rig.sim.ball_position.z = -80.0;
        rig.sim.game_elapsed = 0.99;

        let command = rig.tick(0.02);
        assert_eq!(rig.sim.phase(), Phase::Lost);
        assert_eq!(command, Some(MusicCommand::Stop));
    }

    #[test]
    fn test_no_loss_when_pad_is_under_the_ball() {
        let mut rig = Rig::new(GameOptions::default(), bounce_schedule());
        rig.start();

        rig.sim.ball_direction = Vector3::zeros();
        let (left, right, front, back) = rig.sim.pad_rectangle();
        rig.sim.ball_position.x = (left + right) / 2.0;
        rig.sim.ball_position.z = (front + back) / 2.0;
        rig.sim.game_elapsed = 0.99;

        assert_eq!(rig.tick(0.02), None);
        assert_eq!(rig.sim.phase(), Phase::Playing);
    }

    #[test]
    fn test_lost_then_left_release_restarts() {
        let mut rig = Rig::new(GameOptions::default(), bounce_schedule());
        rig.start();
        rig.sim.ball_direction = Vector3::zeros();
        rig.sim.ball_position.x = 0.0;
        rig.sim.ball_position.z = -80.0;
        rig.sim.game_elapsed = 0.99;
        rig.tick(0.02);
        assert_eq!(rig.sim.phase(), Phase::Lost);

        rig.input.update_buttons(true, false);
        rig.tick(0.1);
        assert_eq!(rig.sim.phase(), Phase::Lost);

        rig.input.update_buttons(false, false);
        rig.tick(0.1);
        assert_eq!(rig.sim.phase(), Phase::NotStarted);
        // The beat cursor rewound with the restart.
        assert_eq!(rig.sim.schedule.segment().start, 0.0);
    }

    #[test]
    fn test_pause_freezes_game_time() {
        let mut rig = Rig::new(GameOptions::default(), vec![(0.0, Bottom), (100.0, Bottom)]);
        rig.start();
        rig.tick(0.5);

        rig.input.update_buttons(false, true);
        rig.tick(0.1);
        rig.input.update_buttons(false, false);
        let command = rig.tick(0.1);
        assert_eq!(rig.sim.phase(), Phase::Paused);
        assert_eq!(command, Some(MusicCommand::Pause));

        let frozen = rig.sim.game_elapsed();
        let total_before = rig.sim.total_elapsed();
        rig.tick(1.0);
        assert_eq!(rig.sim.phase(), Phase::Paused);
        // Wall clock runs, game clock does not.
        assert!(rig.sim.total_elapsed() > total_before);
        assert_eq!(rig.sim.game_elapsed(), frozen);

        rig.input.update_buttons(false, true);
        rig.tick(0.1);
        rig.input.update_buttons(false, false);
        let command = rig.tick(0.1);
        assert_eq!(rig.sim.phase(), Phase::Playing);
        assert_eq!(command, Some(MusicCommand::Resume));
    }

    #[test]
    fn test_autoplay_tracks_ball_exactly() {
        let options = GameOptions {
            enable_autoplay: true,
            ..GameOptions::default()
        };
        let mut rig = Rig::new(options, vec![(0.0, Bottom), (1e4, Bottom)]);
        rig.start();

        let b = *rig.sim.bounds();
        rig.sim.ball_direction = Vector3::zeros();
        rig.sim.ball_position.x = b.ball_min_x;
        rig.sim.ball_position.z = b.ball_min_z;
        rig.tick(0.01);

        let (pad_x, pad_z) = rig.sim.pad_axes();
        assert!((pad_x - 1.0).abs() < 1e-9);
        assert!((pad_z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_preview_ball_follows_pad_before_start() {
        let mut rig = Rig::new(GameOptions::default(), bounce_schedule());
        let b = *rig.sim.bounds();

        rig.input.pad_x = 1.0;
        rig.input.pad_z = 1.0;
        rig.tick(0.1);
        assert!((rig.sim.ball_position().x - b.ball_min_x).abs() < 1e-9);
        assert!((rig.sim.ball_position().z - b.ball_min_z).abs() < 1e-9);
        assert!((rig.sim.ball_position().y - b.ball_bottom_y).abs() < 1e-9);

        // Time does not advance before the game starts.
        assert_eq!(rig.sim.total_elapsed(), 0.0);
    }

    #[test]
    fn test_scene_nodes_receive_tick_results() {
        let mut rig = Rig::new(GameOptions::default(), bounce_schedule());
        rig.input.pad_x = 0.25;
        rig.input.pad_z = 0.75;
        rig.tick(0.1);

        let ball = rig.graph.node(rig.handles.ball);
        let expected = beatbounce_core::vec3_to_glam(rig.sim.ball_position());
        assert!((ball.position - expected).length() < 1e-6);
        assert_eq!(ball.scale, Vec3::splat(BALL_RADIUS as f32));

        let pad = rig.graph.node(rig.handles.pad);
        // Pad center Y sits on the box floor.
        assert!((pad.position.y - (-10.0 - 45.0 + 1.5) as f32).abs() < 1e-4);

        let box_node = rig.graph.node(rig.handles.box_node);
        assert_eq!(box_node.position, Vec3::new(0.0, -10.0, -80.0));
    }
}
