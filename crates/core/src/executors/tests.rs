use std::cell::RefCell;
use std::rc::Rc;

use forma_scene::{Bounds, Model, ModelKind, ModelStore, Plane, Spin};
use glam::{Quat, Vec3};

use super::{register_executors, ExecContext};
use crate::command::{
    ChangeCylinderCommand, ChangePlaneCommand, ChangeSpinCommand, ChangeTorusCommand,
    CommandManager, PlaneCommandKind, RotateCommand, ScaleCommand, ScaleSide, SpinCommandKind,
    TranslateCommand,
};
use crate::targets::TargetManager;
use crate::tuning::Tuning;

struct Fixture {
    models: Rc<RefCell<ModelStore>>,
    manager: Rc<RefCell<CommandManager>>,
    _targets: Rc<TargetManager>,
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
        let context = ExecContext {
            models: Rc::clone(&models),
            target_manager: Rc::downgrade(&targets),
        };
        register_executors(&mut manager.borrow_mut(), &context);
        Self {
            models,
            manager,
            _targets: targets,
        }
    }

    fn model(&self, name: &str) -> Model {
        self.models.borrow().get(name).expect("model").clone()
    }
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn clipped(name: &str, plane: Plane) -> Model {
    Model::new(
        name,
        ModelKind::Clipped {
            plane,
            operand_bounds: Bounds::default(),
        },
    )
}

#[test]
fn change_clip_sets_and_restores_planes() {
    let old0 = Plane::new(2.0, Vec3::Y);
    let old1 = Plane::new(-1.0, Vec3::Z);
    let fx = Fixture::new([clipped("C0", old0), clipped("C1", old1)]);
    let plane = Plane::new(0.5, Vec3::X);
    fx.manager.borrow_mut().add_and_do(Box::new(ChangePlaneCommand::new(
        PlaneCommandKind::Clip,
        names(&["C0", "C1"]),
        plane,
    )));
    for name in ["C0", "C1"] {
        let model_plane = fx.model(name).plane().expect("plane");
        assert!((model_plane.distance - 0.5).abs() < 1.0e-5);
        assert!(model_plane.normal.distance(Vec3::X) < 1.0e-5);
    }

    fx.manager.borrow_mut().undo();
    assert_eq!(fx.model("C0").plane(), Some(old0));
    assert_eq!(fx.model("C1").plane(), Some(old1));
}

#[test]
fn plane_is_converted_to_object_coordinates() {
    let mut model = clipped("C", Plane::default());
    model.translation = Vec3::new(0.0, 3.0, 0.0);
    model.scale = Vec3::splat(2.0);
    let fx = Fixture::new([model]);
    fx.manager.borrow_mut().add_and_do(Box::new(ChangePlaneCommand::new(
        PlaneCommandKind::Mirror,
        names(&["C"]),
        Plane::new(5.0, Vec3::Y),
    )));
    let plane = fx.model("C").plane().expect("plane");
    assert!(plane.normal.distance(Vec3::Y) < 1.0e-5);
    assert!((plane.distance - 1.0).abs() < 1.0e-5);
}

#[test]
fn missing_models_are_skipped() {
    let fx = Fixture::new([clipped("C", Plane::default())]);
    fx.manager.borrow_mut().add_and_do(Box::new(ChangePlaneCommand::new(
        PlaneCommandKind::Clip,
        names(&["Gone", "C"]),
        Plane::new(1.0, Vec3::X),
    )));
    assert!(fx.model("C").plane().expect("plane").normal.distance(Vec3::X) < 1.0e-5);
    fx.manager.borrow_mut().undo();
    assert_eq!(fx.model("C").plane(), Some(Plane::default()));
}

#[test]
fn change_twist_round_trip() {
    let model = Model::new(
        "T",
        ModelKind::Twisted {
            spin: Spin::default(),
            operand_bounds: Bounds::default(),
        },
    );
    let fx = Fixture::new([model]);
    let spin = Spin {
        center: Vec3::new(1.0, 0.0, 0.0),
        axis: Vec3::X,
        angle: 30.0,
        offset: 0.0,
    };
    fx.manager.borrow_mut().add_and_do(Box::new(ChangeSpinCommand::new(
        SpinCommandKind::Twist,
        names(&["T"]),
        spin,
    )));
    let new_spin = fx.model("T").spin().expect("spin");
    assert!(new_spin.center.distance(spin.center) < 1.0e-5);
    assert!((new_spin.angle - 30.0).abs() < 1.0e-5);

    fx.manager.borrow_mut().undo();
    assert_eq!(fx.model("T").spin(), Some(Spin::default()));
    fx.manager.borrow_mut().redo();
    assert!((fx.model("T").spin().expect("spin").angle - 30.0).abs() < 1.0e-5);
}

#[test]
fn scale_keeps_opposite_side_fixed() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    fx.manager.borrow_mut().add_and_do(Box::new(ScaleCommand::new(
        names(&["B"]),
        Vec3::new(2.0, 1.0, 1.0),
        ScaleSide::Max,
    )));
    let model = fx.model("B");
    assert!(model.scale.distance(Vec3::new(2.0, 1.0, 1.0)) < 1.0e-5);
    let bounds = model.stage_bounds();
    assert!((bounds.min.x + 1.0).abs() < 1.0e-5);
    assert!((bounds.max.x - 3.0).abs() < 1.0e-5);

    fx.manager.borrow_mut().undo();
    let model = fx.model("B");
    assert_eq!(model.scale, Vec3::ONE);
    assert_eq!(model.translation, Vec3::ZERO);
}

#[test]
fn symmetric_scale_keeps_center() {
    let mut model = Model::new("B", ModelKind::Box);
    model.translation = Vec3::new(4.0, 0.0, 0.0);
    let fx = Fixture::new([model]);
    fx.manager.borrow_mut().add_and_do(Box::new(ScaleCommand::new(
        names(&["B"]),
        Vec3::splat(3.0),
        ScaleSide::Center,
    )));
    let model = fx.model("B");
    assert!(model.translation.distance(Vec3::new(4.0, 0.0, 0.0)) < 1.0e-5);
    assert!(model.scale.distance(Vec3::splat(3.0)) < 1.0e-5);
}

#[test]
fn rotate_about_primary() {
    let mut other = Model::new("B", ModelKind::Box);
    other.translation = Vec3::new(2.0, 0.0, 0.0);
    let fx = Fixture::new([Model::new("A", ModelKind::Box), other]);
    let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    fx.manager
        .borrow_mut()
        .add_and_do(Box::new(RotateCommand::new(names(&["A", "B"]), rotation)));
    assert!(fx.model("A").translation.length() < 1.0e-5);
    assert!(fx.model("B").translation.distance(Vec3::new(0.0, 0.0, -2.0)) < 1.0e-4);
    assert!(fx.model("B").rotation.angle_between(rotation) < 1.0e-4);

    fx.manager.borrow_mut().undo();
    assert_eq!(fx.model("B").translation, Vec3::new(2.0, 0.0, 0.0));
    assert_eq!(fx.model("B").rotation, Quat::IDENTITY);
}

#[test]
fn rotate_in_place_keeps_positions() {
    let mut other = Model::new("B", ModelKind::Box);
    other.translation = Vec3::new(2.0, 0.0, 0.0);
    let fx = Fixture::new([Model::new("A", ModelKind::Box), other]);
    let mut command = RotateCommand::new(names(&["A", "B"]), Quat::from_rotation_x(0.5));
    command.is_in_place = true;
    fx.manager.borrow_mut().add_and_do(Box::new(command));
    assert_eq!(fx.model("B").translation, Vec3::new(2.0, 0.0, 0.0));
    assert!(fx.model("B").rotation.angle_between(Quat::from_rotation_x(0.5)) < 1.0e-4);
}

#[test]
fn simulated_translation_reapplies_from_start() {
    let fx = Fixture::new([Model::new("B", ModelKind::Box)]);
    let mut command = TranslateCommand::new(names(&["B"]), Vec3::X);
    fx.manager.borrow_mut().simulate_do(&mut command);
    command.translation = Vec3::new(3.0, 0.0, 0.0);
    fx.manager.borrow_mut().simulate_do(&mut command);
    assert_eq!(fx.model("B").translation, Vec3::new(3.0, 0.0, 0.0));
    assert_eq!(fx.manager.borrow().command_list().command_count(), 0);
}

#[test]
fn cylinder_and_torus_radii() {
    let cylinder = Model::new(
        "Cyl",
        ModelKind::Cylinder {
            top_radius: 1.0,
            bottom_radius: 1.0,
        },
    );
    let torus = Model::new(
        "Tor",
        ModelKind::Torus {
            inner_radius: 0.2,
            outer_radius: 1.0,
        },
    );
    let fx = Fixture::new([cylinder, torus]);
    fx.manager.borrow_mut().add_and_do(Box::new(ChangeCylinderCommand::new(
        names(&["Cyl"]),
        true,
        2.5,
    )));
    assert_eq!(fx.model("Cyl").cylinder_radii(), Some((2.5, 1.0)));

    fx.manager.borrow_mut().add_and_do(Box::new(ChangeTorusCommand::new(
        names(&["Tor"]),
        true,
        0.6,
    )));
    let (inner, outer) = fx.model("Tor").torus_radii().expect("torus");
    assert!((inner - 0.6).abs() < 1.0e-6);
    assert!(outer >= 1.2);

    fx.manager.borrow_mut().undo();
    fx.manager.borrow_mut().undo();
    assert_eq!(fx.model("Tor").torus_radii(), Some((0.2, 1.0)));
    assert_eq!(fx.model("Cyl").cylinder_radii(), Some((1.0, 1.0)));
}
