use std::cell::RefCell;
use std::rc::Rc;

use forma_scene::{Bounds, Model, ModelKind, ModelStore, Plane, Selection, Spin};
use glam::{Quat, Vec3};

use super::*;
use crate::command::{CommandManager, ScaleCommand, ScaleSide};
use crate::executors::{register_executors, ExecContext};
use crate::feedback::FeedbackManager;
use crate::targets::{EdgeTarget, PointTarget, TargetManager};
use crate::tuning::Tuning;
use crate::widgets::testing::DragTester;

struct Fixture {
    context: Rc<ToolContext>,
}

impl Fixture {
    fn new(models: impl IntoIterator<Item = Model>) -> Self {
        let mut store = ModelStore::new();
        for model in models {
            store.add(model).expect("unique model");
        }
        let models = Rc::new(RefCell::new(store));
        let manager = Rc::new(RefCell::new(CommandManager::new()));
        let targets = Rc::new(TargetManager::new(Rc::clone(&manager), Tuning::default()));
        let exec_context = ExecContext {
            models: Rc::clone(&models),
            target_manager: Rc::downgrade(&targets),
        };
        register_executors(&mut manager.borrow_mut(), &exec_context);
        let feedback = Rc::new(RefCell::new(FeedbackManager::with_builtin_feedback()));
        Self {
            context: Rc::new(ToolContext::new(models, manager, targets, feedback)),
        }
    }

    fn model(&self, name: &str) -> Model {
        self.context.models.borrow().get(name).expect("model").clone()
    }

    fn command_count(&self) -> usize {
        self.context.command_manager.borrow().command_list().command_count()
    }

    fn active_feedback(&self) -> usize {
        self.context.feedback_manager.borrow().active_count()
    }

    fn show_point_target(&self, position: Vec3, direction: Vec3) {
        let targets = &self.context.target_manager;
        targets.set_point_target(PointTarget::new(position, direction));
        targets.set_point_target_visible(true);
    }

    fn show_edge_target(&self, length: f32) {
        let targets = &self.context.target_manager;
        let edge = EdgeTarget::new(Vec3::ZERO, Vec3::new(0.0, length, 0.0)).expect("edge");
        targets.set_edge_target(edge);
        targets.set_edge_target_visible(true);
    }
}

fn attach(tool: &mut dyn Tool, name: &str) {
    tool.attach_to_selection(&Selection::from_names([name]), 0);
}

/// Starts with the first sample, continues with the rest, then ends.
fn drag(tool: &mut dyn Tool, infos: &[DragInfo]) {
    tool.start_drag(&infos[0]);
    for info in &infos[1..] {
        tool.continue_drag(info);
    }
    tool.end_drag();
}

fn clipped(name: &str) -> Model {
    Model::new(
        name,
        ModelKind::Clipped {
            plane: Plane::default(),
            operand_bounds: Bounds::from_size(Vec3::splat(6.0)),
        },
    )
}

fn torus(name: &str) -> Model {
    Model::new(
        name,
        ModelKind::Torus {
            inner_radius: 0.5,
            outer_radius: 2.0,
        },
    )
}

fn assert_near(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1.0e-3,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn tools_attach_only_to_matching_models() {
    let fx = Fixture::new([clipped("C"), Model::new("B", ModelKind::Box), torus("T")]);
    let clip = PlaneBasedTool::clip(Rc::clone(&fx.context));
    let mirror = PlaneBasedTool::mirror(Rc::clone(&fx.context));
    let torus_tool = TorusTool::new(Rc::clone(&fx.context));
    let scale = ScaleTool::new(Rc::clone(&fx.context));

    assert!(clip.can_be_used_for(&Selection::from_names(["C"])));
    assert!(!clip.can_be_used_for(&Selection::from_names(["C", "B"])));
    assert!(!mirror.can_be_used_for(&Selection::from_names(["C"])));
    assert!(torus_tool.can_be_used_for(&Selection::from_names(["T"])));
    assert!(!torus_tool.can_be_used_for(&Selection::new()));
    assert!(scale.can_be_used_for(&Selection::from_names(["B", "T"])));
    assert!(clip.is_specialized());
    assert!(!scale.is_specialized());
}

#[test]
#[should_panic(expected = "requires can_attach()")]
fn attaching_to_wrong_kind_panics() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = PlaneBasedTool::clip(Rc::clone(&fx.context));
    attach(&mut tool, "B");
}

#[test]
fn clip_tool_translates_plane() {
    let fx = Fixture::new([clipped("C")]);
    let mut tool = PlaneBasedTool::clip(Rc::clone(&fx.context));
    attach(&mut tool, "C");
    assert_eq!(tool.widget().translation_range(), (-3.0, 3.0));

    let started = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&started);
    tool.base_mut()
        .drag_started()
        .add_observer("test", move |name: &str| log.borrow_mut().push(name.to_string()));

    let tester = DragTester::new(["PlaneWidget", "Translator"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0)));

    assert_eq!(*started.borrow(), vec!["ClipTool".to_string()]);
    assert_eq!(fx.command_count(), 1);
    let plane = fx.model("C").plane().expect("plane");
    assert_near(plane.distance, 2.0);
    assert!(plane.normal.distance(Vec3::Y) < 1.0e-5);
    assert_near(tool.widget().plane().distance, 2.0);
    assert_eq!(fx.active_feedback(), 0);
    assert!(!tool.is_dragging());
}

#[test]
fn clip_translation_snaps_to_point_target() {
    let fx = Fixture::new([clipped("C")]);
    fx.show_point_target(Vec3::new(0.0, 2.0, 0.0), Vec3::X);
    let mut tool = PlaneBasedTool::clip(Rc::clone(&fx.context));
    attach(&mut tool, "C");

    let tester = DragTester::new(["PlaneWidget", "Translator"]);
    let infos = tester.mouse_drag(Vec3::ZERO, Vec3::new(0.0, 1.8, 0.0));
    tool.start_drag(&infos[0]);
    tool.continue_drag(&infos[1]);
    assert!(tool.is_snapped());
    assert_near(tool.stage_plane().distance, 2.0);
    assert_near(tool.widget().plane().distance, 2.0);
    let id = tool.feedback().expect("translation feedback");
    let color = fx.context.feedback_manager.borrow().get(id).color();
    assert_eq!(color, fx.context.tuning().colors.snapped);
    tool.end_drag();

    assert_near(fx.model("C").plane().expect("plane").distance, 2.0);
    assert!(!fx.context.target_manager.is_snapping());
}

#[test]
fn unchanged_clip_drag_is_discarded() {
    let fx = Fixture::new([clipped("C")]);
    let mut tool = PlaneBasedTool::clip(Rc::clone(&fx.context));
    attach(&mut tool, "C");

    let ended = Rc::new(RefCell::new(0));
    let count = Rc::clone(&ended);
    tool.base_mut()
        .drag_ended()
        .add_observer("test", move |_: &str| *count.borrow_mut() += 1);

    // Snaps back onto the model center.
    let tester = DragTester::new(["PlaneWidget", "Translator"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::ZERO, Vec3::new(0.0, 0.5, 0.0)));

    assert_eq!(*ended.borrow(), 1);
    assert_eq!(fx.command_count(), 0);
    assert_eq!(fx.model("C").plane(), Some(Plane::default()));
}

#[test]
fn detaching_mid_drag_reverts_and_releases_feedback() {
    let fx = Fixture::new([clipped("C")]);
    let mut tool = PlaneBasedTool::clip(Rc::clone(&fx.context));
    attach(&mut tool, "C");

    let tester = DragTester::new(["PlaneWidget", "Translator"]);
    let infos = tester.mouse_drag(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0));
    tool.start_drag(&infos[0]);
    tool.continue_drag(&infos[1]);
    assert_eq!(fx.active_feedback(), 1);
    assert_near(fx.model("C").plane().expect("plane").distance, 2.0);

    tool.detach_from_selection();

    assert_eq!(fx.active_feedback(), 0);
    assert_eq!(fx.command_count(), 0);
    assert_eq!(fx.model("C").plane(), Some(Plane::default()));
    assert!(!tool.is_dragging());
    assert!(!tool.base().is_attached());
    assert!(!fx.context.target_manager.is_snapping());
}

#[test]
fn detaching_translation_mid_drag_leaves_model_in_place() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = TranslationTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let tester = DragTester::new(["XSlider"]);
    let infos = tester.mouse_drag(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
    tool.start_drag(&infos[0]);
    tool.continue_drag(&infos[1]);
    tool.detach_from_selection();

    assert_eq!(fx.active_feedback(), 0);
    assert_eq!(fx.command_count(), 0);
    assert!(fx.model("B").translation.length() < 1.0e-6);
    assert!(!tool.is_dragging());
}

#[test]
fn clip_rotation_snaps_to_principal_axis() {
    let fx = Fixture::new([clipped("C")]);
    let mut tool = PlaneBasedTool::clip(Rc::clone(&fx.context));
    attach(&mut tool, "C");

    let tester = DragTester::new(["PlaneWidget", "Rotator"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::ZERO, Vec3::new(0.0, 4.5, 0.0)));

    let plane = fx.model("C").plane().expect("plane");
    assert!(plane.normal.distance(Vec3::NEG_Z) < 1.0e-4);
    assert_near(plane.distance, 0.0);
    assert_eq!(fx.command_count(), 1);
}

#[test]
fn mirror_translation_range_extends_past_model() {
    let fx = Fixture::new([Model::new(
        "M",
        ModelKind::Mirrored {
            plane: Plane::default(),
            operand_bounds: Bounds::default(),
        },
    )]);
    let mut tool = PlaneBasedTool::mirror(Rc::clone(&fx.context));
    attach(&mut tool, "M");
    assert_eq!(tool.widget().translation_range(), (-3.0, 3.0));
}

#[test]
fn plane_grip_hover_picks_translator_along_normal() {
    let fx = Fixture::new([clipped("C")]);
    let mut tool = PlaneBasedTool::clip(Rc::clone(&fx.context));
    attach(&mut tool, "C");

    let mut info = GripInfo::new(Vec3::NEG_Y);
    tool.update_grip_info(&mut info);
    assert_eq!(info.guide_type, GripGuideType::Basic);
    assert_eq!(info.widget_path, ["PlaneWidget", "Translator"]);

    let mut info = GripInfo::new(Vec3::X);
    tool.update_grip_info(&mut info);
    assert_eq!(info.guide_type, GripGuideType::Rotation);
    assert_eq!(info.widget_path, ["PlaneWidget", "Rotator"]);
}

#[test]
fn twist_ring_changes_angle_with_precision() {
    let fx = Fixture::new([Model::new(
        "W",
        ModelKind::Twisted {
            spin: Spin::default(),
            operand_bounds: Bounds::default(),
        },
    )]);
    let mut tool = SpinBasedTool::twist(Rc::clone(&fx.context));
    attach(&mut tool, "W");

    let mut tester = DragTester::new(["SpinWidget", "Ring"]);
    tester.set_ray_direction(Vec3::NEG_Y);
    let end = Quat::from_rotation_y(30.4_f32.to_radians()) * Vec3::X;
    let infos = tester.mouse_drag(Vec3::X, end);
    tool.start_drag(&infos[0]);
    tool.continue_drag(&infos[1]);
    assert!(tool.feedback().is_some());
    tool.end_drag();

    let spin = fx.model("W").spin().expect("spin");
    assert_near(spin.angle, 30.0);
    assert_eq!(fx.command_count(), 1);
    assert_eq!(fx.active_feedback(), 0);
}

#[test]
fn bend_tool_requires_bent_models() {
    let fx = Fixture::new([Model::new(
        "W",
        ModelKind::Twisted {
            spin: Spin::default(),
            operand_bounds: Bounds::default(),
        },
    )]);
    let tool = SpinBasedTool::bend(Rc::clone(&fx.context));
    assert!(!tool.can_attach(&Selection::from_names(["W"])));
}

#[test]
fn scale_tool_moves_max_side() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = ScaleTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");
    assert_near(tool.scaler("XScaler").expect("scaler").length(), 2.0);

    let tester = DragTester::new(["XScaler", "MaxSlider"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::X, Vec3::new(2.0, 0.0, 0.0)));

    let manager = fx.context.command_manager.borrow();
    let command = manager.last_command().downcast_ref::<ScaleCommand>().expect("scale");
    assert_eq!(command.side, ScaleSide::Max);
    assert_near(command.ratios.x, 1.5);
    drop(manager);

    let bounds = fx.model("B").stage_bounds();
    assert_near(bounds.min.x, -1.0);
    assert_near(bounds.max.x, 2.0);
    assert_near(tool.scaler("XScaler").expect("scaler").length(), 3.0);
}

#[test]
fn symmetric_scale_keeps_center() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = ScaleTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let mut tester = DragTester::new(["XScaler", "MaxSlider"]);
    tester.set_is_modified_mode(true);
    drag(&mut tool, &tester.mouse_drag(Vec3::X, Vec3::new(1.5, 0.0, 0.0)));

    let model = fx.model("B");
    assert_near(model.scale.x, 1.5);
    assert_near(model.translation.x, 0.0);
}

#[test]
fn scale_snaps_to_edge_target_length() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    fx.show_edge_target(4.0);
    let mut tool = ScaleTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let tester = DragTester::new(["XScaler", "MaxSlider"]);
    let infos = tester.mouse_drag(Vec3::X, Vec3::new(2.6, 0.0, 0.0));
    tool.start_drag(&infos[0]);
    tool.continue_drag(&infos[1]);
    assert!(tool.is_snapped());
    tool.end_drag();

    assert_near(fx.model("B").scale.x, 2.0);
    assert!(!tool.is_snapped());
}

#[test]
fn scale_grip_hover_picks_handle() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = ScaleTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let mut info = GripInfo::new(Vec3::NEG_Z);
    tool.update_grip_info(&mut info);
    assert_eq!(info.widget_path, ["ZScaler", "MaxSlider"]);
    assert!(info.target_point.distance(Vec3::Z) < 1.0e-5);

    let mut info = GripInfo::new(Vec3::ONE);
    tool.update_grip_info(&mut info);
    assert!(info.widget_path.is_empty());
}

#[test]
fn rotation_tool_rotates_about_axis() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = RotationTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let mut tester = DragTester::new(["YAxisRotator"]);
    tester.set_ray_direction(Vec3::NEG_Y);
    drag(&mut tool, &tester.mouse_drag(Vec3::X, Vec3::NEG_Z));

    let model = fx.model("B");
    assert!((model.rotation * Vec3::X).distance(Vec3::NEG_Z) < 1.0e-4);
    assert_eq!(fx.command_count(), 1);
    assert_eq!(fx.active_feedback(), 0);
}

#[test]
fn rotation_snaps_to_point_target_direction() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    fx.show_point_target(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_Z);
    let mut tool = RotationTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let mut tester = DragTester::new(["YAxisRotator"]);
    tester.set_ray_direction(Vec3::NEG_Y);
    let end = Quat::from_rotation_y(80.0_f32.to_radians()) * Vec3::X;
    let infos = tester.mouse_drag(Vec3::X, end);
    tool.start_drag(&infos[0]);
    tool.continue_drag(&infos[1]);
    assert!(tool.is_snapped());
    tool.end_drag();

    let model = fx.model("B");
    assert!((model.rotation * Vec3::X).distance(Vec3::NEG_Z) < 1.0e-4);
}

#[test]
fn rotation_grip_hover_falls_back_to_free_rotator() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = RotationTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let mut info = GripInfo::new(Vec3::NEG_X);
    tool.update_grip_info(&mut info);
    assert_eq!(info.widget_path, ["XAxisRotator"]);

    let mut info = GripInfo::new(Vec3::ONE);
    tool.update_grip_info(&mut info);
    assert_eq!(info.widget_path, ["FreeRotator"]);
    assert_eq!(info.guide_type, GripGuideType::Rotation);
}

#[test]
fn translation_rounds_to_precision() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = TranslationTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let tester = DragTester::new(["XSlider"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::ZERO, Vec3::new(2.04, 0.0, 0.0)));

    let translation = fx.model("B").translation;
    assert_near(translation.x, 2.0);
    assert_near(translation.y, 0.0);
    assert_near(tool.slider(0).value(), 0.0);
}

#[test]
fn translation_snaps_bounds_to_point_target() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    fx.show_point_target(Vec3::new(3.0, 0.0, 0.0), Vec3::Y);
    let mut tool = TranslationTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let tester = DragTester::new(["XSlider"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::ZERO, Vec3::new(1.7, 0.0, 0.0)));

    assert_near(fx.model("B").translation.x, 2.0);
    assert_near(fx.model("B").stage_bounds().max.x, 3.0);
}

#[test]
fn undo_restores_translated_model() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = TranslationTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");

    let tester = DragTester::new(["YSlider"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0)));
    assert_near(fx.model("B").translation.y, 3.0);

    fx.context.command_manager.borrow_mut().undo();
    assert!(fx.model("B").translation.length() < 1.0e-6);
}

#[test]
fn torus_outer_radius_changes() {
    let fx = Fixture::new([torus("T")]);
    let mut tool = TorusTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "T");
    assert_near(tool.outer_scaler().length(), 4.0);

    let tester = DragTester::new(["OuterRadiusScaler", "MaxSlider"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)));

    assert_eq!(fx.model("T").torus_radii(), Some((0.5, 3.0)));
    assert_near(tool.outer_scaler().length(), 6.0);
}

#[test]
fn torus_inner_radius_grows_outer() {
    let fx = Fixture::new([torus("T")]);
    let mut tool = TorusTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "T");

    let tester = DragTester::new(["InnerRadiusScaler", "MaxSlider"]);
    drag(
        &mut tool,
        &tester.mouse_drag(Vec3::new(1.5, 0.5, 0.0), Vec3::new(1.5, 1.2, 0.0)),
    );

    let (inner, outer) = fx.model("T").torus_radii().expect("radii");
    assert_near(inner, 1.2);
    assert_near(outer, 2.41);
}

#[test]
fn torus_radius_snaps_to_edge_target() {
    let fx = Fixture::new([torus("T")]);
    fx.show_edge_target(4.0);
    let mut tool = TorusTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "T");

    let tester = DragTester::new(["OuterRadiusScaler", "MaxSlider"]);
    drag(&mut tool, &tester.mouse_drag(Vec3::new(2.0, 0.0, 0.0), Vec3::new(3.8, 0.0, 0.0)));

    assert_eq!(fx.model("T").torus_radii().map(|radii| radii.1), Some(4.0));
}

#[test]
fn torus_grip_hover() {
    let fx = Fixture::new([torus("T")]);
    let mut tool = TorusTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "T");

    let mut info = GripInfo::new(Vec3::NEG_X);
    tool.update_grip_info(&mut info);
    assert_eq!(info.widget_path, ["OuterRadiusScaler", "MaxSlider"]);

    let mut info = GripInfo::new(Vec3::Y);
    tool.update_grip_info(&mut info);
    assert_eq!(info.widget_path, ["InnerRadiusScaler", "MinSlider"]);
}

#[test]
fn cylinder_top_radius_changes() {
    let fx = Fixture::new([Model::new(
        "Y",
        ModelKind::Cylinder {
            top_radius: 1.0,
            bottom_radius: 1.0,
        },
    )]);
    let mut tool = CylinderTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "Y");

    let tester = DragTester::new(["TopRadiusScaler", "MaxSlider"]);
    drag(
        &mut tool,
        &tester.mouse_drag(Vec3::new(1.0, 1.0, 0.0), Vec3::new(1.5, 1.0, 0.0)),
    );

    let (top, bottom) = fx.model("Y").cylinder_radii().expect("radii");
    assert_near(top, 1.5);
    assert_near(bottom, 1.0);
    assert_near(tool.top_scaler().length(), 3.0);
}

#[test]
fn reattach_follows_moved_model() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut tool = ScaleTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");
    fx.context
        .models
        .borrow_mut()
        .get_mut("B")
        .expect("model")
        .translation = Vec3::new(4.0, 0.0, 0.0);
    tool.reattach_to_selection();
    assert!(tool.base().frame_position().distance(Vec3::new(4.0, 0.0, 0.0)) < 1.0e-6);

    tool.detach_from_selection();
    assert!(!tool.base().is_attached());
}

#[test]
fn finish_runs_completion() {
    let fx = Fixture::new([torus("T")]);
    let mut tool = TorusTool::new(Rc::clone(&fx.context));
    let finished = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&finished);
    tool.base_mut()
        .set_completion_func(move || *flag.borrow_mut() = true);
    tool.finish();
    assert!(*finished.borrow());
}

#[test]
fn axis_aligned_session_drops_model_rotation() {
    let mut model = Model::new("B", ModelKind::Box);
    model.rotation = Quat::from_rotation_y(30.0_f32.to_radians());
    let fx = Fixture::new([model]);
    fx.context
        .command_manager
        .borrow_mut()
        .session_state_mut()
        .axis_aligned = true;

    let mut tool = TranslationTool::new(Rc::clone(&fx.context));
    attach(&mut tool, "B");
    assert!(tool.base().frame_rotation().angle_between(Quat::IDENTITY) < 1.0e-5);
    assert!(fx.context.is_axis_aligned());
}
