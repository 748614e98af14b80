use std::cell::RefCell;
use std::rc::Rc;

use forma_scene::{Model, ModelStore, Plane, SceneError, Spin};
use glam::{Quat, Vec3};

use super::{apply_saved, save_once, typed, Snapshot};
use crate::command::{
    ChangeCylinderCommand, ChangePlaneCommand, ChangeSpinCommand, ChangeTorusCommand, Command,
    CommandBase, CommandManager, Op, RotateCommand, ScaleCommand, ScaleSide, TranslateCommand,
};

pub(super) fn register(manager: &mut CommandManager, models: &Rc<RefCell<ModelStore>>) {
    for type_name in ["ChangeClipCommand", "ChangeMirrorCommand"] {
        let models = Rc::clone(models);
        manager.register_function(type_name, move |command, op| {
            change_plane(typed(command), op, &mut models.borrow_mut());
        });
    }
    for type_name in ["ChangeTwistCommand", "ChangeBendCommand"] {
        let models = Rc::clone(models);
        manager.register_function(type_name, move |command, op| {
            change_spin(typed(command), op, &mut models.borrow_mut());
        });
    }
    let store = Rc::clone(models);
    manager.register_function("ScaleCommand", move |command, op| {
        scale(typed(command), op, &mut store.borrow_mut());
    });
    let store = Rc::clone(models);
    manager.register_function("RotateCommand", move |command, op| {
        rotate(typed(command), op, &mut store.borrow_mut());
    });
    let store = Rc::clone(models);
    manager.register_function("TranslateCommand", move |command, op| {
        translate(typed(command), op, &mut store.borrow_mut());
    });
    let store = Rc::clone(models);
    manager.register_function("ChangeCylinderCommand", move |command, op| {
        change_cylinder(typed(command), op, &mut store.borrow_mut());
    });
    let store = Rc::clone(models);
    manager.register_function("ChangeTorusCommand", move |command, op| {
        change_torus(typed(command), op, &mut store.borrow_mut());
    });
}

fn missing_plane(model: &Model) -> SceneError {
    SceneError::WrongKind {
        name: model.name.clone(),
        actual: model.type_name(),
        expected: "ClippedModel",
    }
}

fn missing_spin(model: &Model) -> SceneError {
    SceneError::WrongKind {
        name: model.name.clone(),
        actual: model.type_name(),
        expected: "TwistedModel",
    }
}

/// The command plane is in stage coordinates; models store it in object
/// coordinates.
fn change_plane(command: &mut ChangePlaneCommand, op: Op, models: &mut ModelStore) {
    let names = command.model_names.clone();
    save_once(command.base_mut(), models, &names, |model| {
        model.plane().ok_or_else(|| missing_plane(model))
    });
    let stage_plane = command.plane;
    match op {
        Op::Do => apply_saved(command.base(), models, |model, _: &Plane| {
            let plane = stage_plane.transformed(&model.matrix().inverse());
            model.set_plane(plane)
        }),
        Op::Undo => apply_saved(command.base(), models, |model, old: &Plane| {
            model.set_plane(*old)
        }),
    }
}

fn change_spin(command: &mut ChangeSpinCommand, op: Op, models: &mut ModelStore) {
    let names = command.model_names.clone();
    save_once(command.base_mut(), models, &names, |model| {
        model.spin().ok_or_else(|| missing_spin(model))
    });
    let stage_spin = command.spin;
    match op {
        Op::Do => apply_saved(command.base(), models, |model, _: &Spin| {
            let spin = stage_spin.transformed(&model.matrix().inverse());
            model.set_spin(spin)
        }),
        Op::Undo => apply_saved(command.base(), models, |model, old: &Spin| {
            model.set_spin(*old)
        }),
    }
}

/// Transform of a model before a command changed it.
#[derive(Debug, Clone, Copy)]
struct Pose {
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
}

impl Pose {
    fn of(model: &Model) -> Result<Self, SceneError> {
        Ok(Self {
            scale: model.scale,
            rotation: model.rotation,
            translation: model.translation,
        })
    }
}

fn restore_pose(model: &mut Model, pose: &Pose) -> Result<(), SceneError> {
    model.scale = pose.scale;
    model.rotation = pose.rotation;
    model.translation = pose.translation;
    Ok(())
}

fn save_poses(base: &mut CommandBase, models: &ModelStore, names: &[String]) {
    save_once(base, models, names, Pose::of);
}

/// Scales each model by the ratios in its own axes, keeping the side
/// opposite to `side` in place.
fn scale(command: &mut ScaleCommand, op: Op, models: &mut ModelStore) {
    let names = command.model_names.clone();
    save_poses(command.base_mut(), models, &names);
    let (ratios, side) = (command.ratios, command.side);
    match op {
        Op::Do => apply_saved(command.base(), models, |model, old: &Pose| {
            let bounds = model.bounds();
            let fixed_local = match side {
                ScaleSide::Center => bounds.center(),
                ScaleSide::Min => bounds.max,
                ScaleSide::Max => bounds.min,
            };
            let new_scale = old.scale * ratios;
            let fixed_stage = old.translation + old.rotation * (old.scale * fixed_local);
            model.scale = new_scale;
            model.translation = fixed_stage - old.rotation * (new_scale * fixed_local);
            Ok(())
        }),
        Op::Undo => apply_saved(command.base(), models, restore_pose),
    }
}

/// Rotates each model in place, or about the primary model's position.
fn rotate(command: &mut RotateCommand, op: Op, models: &mut ModelStore) {
    let names = command.model_names.clone();
    save_poses(command.base_mut(), models, &names);
    if op == Op::Undo {
        apply_saved(command.base(), models, restore_pose);
        return;
    }
    let saved = command.base().exec_data::<Snapshot<Pose>>();
    let Some(primary) = saved.and_then(|saved| saved.first()).map(|(_, pose)| *pose) else {
        return;
    };
    let rotation = command.rotation.normalize();
    let stage_rotation = if command.is_axis_aligned {
        rotation
    } else {
        primary.rotation * rotation * primary.rotation.inverse()
    };
    let is_in_place = command.is_in_place;
    apply_saved(command.base(), models, |model, old: &Pose| {
        model.rotation = (stage_rotation * old.rotation).normalize();
        model.translation = if is_in_place {
            old.translation
        } else {
            primary.translation + stage_rotation * (old.translation - primary.translation)
        };
        Ok(())
    });
}

fn translate(command: &mut TranslateCommand, op: Op, models: &mut ModelStore) {
    let names = command.model_names.clone();
    save_poses(command.base_mut(), models, &names);
    let translation = command.translation;
    match op {
        Op::Do => apply_saved(command.base(), models, |model, old: &Pose| {
            model.translation = old.translation + translation;
            Ok(())
        }),
        Op::Undo => apply_saved(command.base(), models, restore_pose),
    }
}

fn change_cylinder(command: &mut ChangeCylinderCommand, op: Op, models: &mut ModelStore) {
    let names = command.model_names.clone();
    let is_top = command.is_top_radius;
    save_once(command.base_mut(), models, &names, |model| {
        model
            .cylinder_radii()
            .map(|(top, bottom)| if is_top { top } else { bottom })
            .ok_or_else(|| SceneError::WrongKind {
                name: model.name.clone(),
                actual: model.type_name(),
                expected: "CylinderModel",
            })
    });
    let radius = command.new_radius;
    match op {
        Op::Do => apply_saved(command.base(), models, |model, _: &f32| {
            model.set_cylinder_radius(is_top, radius)
        }),
        Op::Undo => apply_saved(command.base(), models, |model, old: &f32| {
            model.set_cylinder_radius(is_top, *old)
        }),
    }
}

/// Saves both radii since changing the inner one may grow the outer one.
fn change_torus(command: &mut ChangeTorusCommand, op: Op, models: &mut ModelStore) {
    let names = command.model_names.clone();
    save_once(command.base_mut(), models, &names, |model| {
        model.torus_radii().ok_or_else(|| SceneError::WrongKind {
            name: model.name.clone(),
            actual: model.type_name(),
            expected: "TorusModel",
        })
    });
    let (is_inner, radius) = (command.is_inner_radius, command.new_radius);
    match op {
        Op::Do => apply_saved(command.base(), models, |model, old: &(f32, f32)| {
            model.set_torus_radius(true, old.0)?;
            model.set_torus_radius(false, old.1)?;
            model.set_torus_radius(is_inner, radius)
        }),
        Op::Undo => apply_saved(command.base(), models, |model, old: &(f32, f32)| {
            model.set_torus_radius(true, old.0)?;
            model.set_torus_radius(false, old.1)
        }),
    }
}
