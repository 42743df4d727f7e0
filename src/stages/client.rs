//! Filesystem and toolchain checks for startup scripts and the companion
//! client. These stages make no HTTP calls.

use crate::runner::{Stage, StageContext};
use crate::shell::{execute, CommandOptions};

/// Per-OS startup scripts must exist at the project root.
pub struct StartupScripts;

impl Stage for StartupScripts {
    fn name(&self) -> &str {
        "Startup Scripts"
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let root = ctx.project_root().to_path_buf();
        let family = ctx.host().family();
        for script in family.startup_scripts() {
            let name = format!("Startup Script: {}", script);
            if root.join(script).is_file() {
                ctx.pass(&name, "Script exists");
            } else {
                ctx.fail(&name, "Script missing");
            }
        }
        Ok(())
    }
}

/// Every required client source file must exist.
pub struct ClientStructure;

impl Stage for ClientStructure {
    fn name(&self) -> &str {
        "Client Structure"
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        let client_dir = ctx.project_root().join(&ctx.config().client.dir);
        let required = ctx.config().client.required_files.clone();

        let mut all_present = true;
        for file in &required {
            let name = format!("File Check: {}", file);
            if client_dir.join(file).exists() {
                ctx.pass(&name, "File exists");
            } else {
                all_present = false;
                ctx.fail(&name, "File missing");
            }
        }

        if all_present {
            ctx.pass("Mobile App Structure", "All required files present");
        } else {
            ctx.fail("Mobile App Structure", "Some files missing");
        }
        Ok(())
    }
}

/// The client's type-check command must exit cleanly.
pub struct ClientCompile;

impl Stage for ClientCompile {
    fn name(&self) -> &str {
        "Client Compile"
    }

    fn execute(&self, ctx: &mut StageContext<'_>) -> anyhow::Result<()> {
        const CHECK: &str = "TypeScript Compilation";

        let Some(argv) = ctx.config().client.compile.clone() else {
            return Ok(());
        };
        let client_dir = ctx.project_root().join(&ctx.config().client.dir);

        match execute(&argv, &CommandOptions::captured(Some(&client_dir))) {
            Ok(result) if result.success => ctx.pass(CHECK, "No compilation errors"),
            Ok(result) => ctx.fail(
                CHECK,
                format!("Compilation errors: {}", result.diagnostics()),
            ),
            Err(e) => ctx.fail(CHECK, format!("Error: {}", e)),
        }
        Ok(())
    }
}
