use gl_generator::{Api, Fallbacks, Profile, Registry, StructGenerator};
use std::env;
use std::fs::File;
use std::path::Path;

fn main() {
    let dest = env::var("OUT_DIR").unwrap();
    let mut file = File::create(&Path::new(&dest).join("bindings.rs")).unwrap();

    Registry::new(
        Api::Gl,
        (4, 6),
        Profile::Core,
        Fallbacks::All,
        [
            "GL_ARB_gl_spirv",
            "GL_ARB_spirv_extensions",
            "GL_ARB_texture_view",
            "GL_KHR_debug",
        ],
    )
    .write_bindings(StructGenerator, &mut file)
    .unwrap();
}
