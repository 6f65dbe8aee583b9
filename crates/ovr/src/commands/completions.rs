use clap_complete::{generate, Shell};

#[derive(Debug, clap::Parser)]
pub struct CompletionsCommand {
    shell: Shell,
}

impl CompletionsCommand {
    pub fn exec<T: clap::Parser>(self) -> anyhow::Result<()> {
        let mut command = T::command();
        let name = command.get_name().to_string();
        generate(self.shell, &mut command, name, &mut std::io::stdout());
        Ok(())
    }
}
