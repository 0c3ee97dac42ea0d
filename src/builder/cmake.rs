//! CMake generator and build tool invocations.

use crate::builder::context::BuildContext;
use crate::util::process::ProcessBuilder;

/// CMake invocation for a resolved build context.
pub struct CMakeInvocation<'a> {
    ctx: &'a BuildContext,
}

impl<'a> CMakeInvocation<'a> {
    /// Create the invocation for a build context.
    pub fn new(ctx: &'a BuildContext) -> Self {
        CMakeInvocation { ctx }
    }

    /// Arguments passed to the generator, in order.
    ///
    /// The flags string is a single argument even when it contains spaces or
    /// is empty; it is never split or validated.
    pub fn configure_args(&self) -> Vec<String> {
        let settings = &self.ctx.settings;
        let mut args = vec!["-G".to_string(), settings.generator.clone()];

        // Build type
        args.push(format!(
            "-DCMAKE_BUILD_TYPE={}",
            self.ctx.profile.optimization.as_cmake_build_type()
        ));

        // Variant flags
        args.push(format!("-DCMAKE_CXX_FLAGS={}", self.ctx.profile.compiler_flags));

        // Toolchain definitions
        args.extend(self.ctx.toolchain.definitions.iter().map(|d| d.to_string()));

        // Compilers
        args.push(format!("-DCMAKE_C_COMPILER={}", self.ctx.toolchain.cc));
        args.push(format!("-DCMAKE_CXX_COMPILER={}", self.ctx.toolchain.cxx));

        // Source directory
        args.push(settings.source_dir.display().to_string());

        args
    }

    /// Generator command, run inside the build directory.
    pub fn configure_command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.ctx.settings.generator_program)
            .args(self.configure_args())
            .cwd(&self.ctx.build_dir)
    }

    /// Build tool command: no arguments, same working directory.
    pub fn build_command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.ctx.settings.build_tool).cwd(&self.ctx.build_dir)
    }
}
