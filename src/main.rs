use bevy::prelude::*;

use plotcraft::plots::{PlotsPlugin, PlotsSet};

mod setup;
mod input;

use input::{camera_controller, input_mapping_system};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        // plots: catalog, world generation, placement, previews
        .add_plugins(PlotsPlugin {
            settings_path: Some("assets/config/plots.ron".into()),
        })
        // camera + light
        .add_systems(Startup, setup::setup)
        // key/mouse -> actions before the plots read them; camera after
        .add_systems(Update, input_mapping_system.before(PlotsSet::Pointer))
        .add_systems(Update, camera_controller.after(input_mapping_system))
        .run();
}
