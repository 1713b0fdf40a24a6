use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd};

use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork, pipe};

use crate::ast::{Command, Pipeline};
use crate::error::{ExecError, STATUS_NOT_FOUND, STATUS_SIGNAL_BASE};
use crate::executor::builtin::BuiltinManager;
use crate::executor::child::{self, PreparedStage, StageFds};
use crate::executor::redirect::BuiltinStreams;
use crate::executor::reaper;
use crate::executor::{ExecStatus, Executor};
use crate::signal::ChildSignalBlock;
use crate::state::ShellState;

pub struct DefaultExecutor {
    builtins: BuiltinManager,
}

impl DefaultExecutor {
    pub fn new() -> Self {
        DefaultExecutor {
            builtins: BuiltinManager::new(),
        }
    }
}

impl Default for DefaultExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for DefaultExecutor {
    fn exec(&mut self, pipeline: &Pipeline, state: &mut ShellState) -> ExecStatus {
        let Some(first) = pipeline.commands.first() else {
            return Ok(0);
        };

        // Builtins change the shell's own state, so a lone builtin never forks
        if pipeline.len() == 1 && first.name().is_some_and(|name| self.builtins.is_builtin(name)) {
            return self.exec_builtin(first, state);
        }
        self.exec_processes(pipeline, state)
    }

    fn reap(&mut self) {
        reaper::reap_overflow();
    }
}

impl DefaultExecutor {
    fn exec_builtin(&self, cmd: &Command, state: &mut ShellState) -> ExecStatus {
        let streams = BuiltinStreams::open(cmd)?;
        log::debug!("builtin: {:?}", cmd.args);

        let mut out: Box<dyn Write> = match streams.output {
            Some(file) => Box::new(file),
            None => Box::new(io::stdout()),
        };
        let mut err: Box<dyn Write> = match streams.error {
            Some(file) => Box::new(file),
            None => Box::new(io::stderr()),
        };
        let status = self
            .builtins
            .execute(&cmd.args, state, &mut out, &mut err)
            .unwrap_or(STATUS_NOT_FOUND);
        Ok(status)
    }

    fn exec_processes(&self, pipeline: &Pipeline, state: &mut ShellState) -> ExecStatus {
        let stages = pipeline
            .commands
            .iter()
            .map(|cmd| PreparedStage::new(cmd, &self.builtins))
            .collect::<Result<Vec<_>, _>>()?;
        let program = state.program.clone().into_bytes();

        // Anything still buffered would otherwise be written once per child
        let _ = io::stdout().flush();

        // Background children must be registered before SIGCHLD can arrive
        let _block = if pipeline.background {
            ChildSignalBlock::new().ok()
        } else {
            None
        };

        let mut pids: Vec<Pid> = Vec::with_capacity(stages.len());
        let mut prev_read: Option<OwnedFd> = None;

        for (i, stage) in stages.iter().enumerate() {
            let is_last = i + 1 == stages.len();

            let next_pipe = if is_last {
                None
            } else {
                match pipe() {
                    Ok(ends) => Some(ends),
                    Err(e) => {
                        drop(prev_read.take());
                        self.abandon(&pids, pipeline.background);
                        return Err(ExecError::Pipe(e));
                    }
                }
            };

            let fds = StageFds {
                stdin: prev_read.as_ref().map(AsRawFd::as_raw_fd),
                stdout: next_pipe.as_ref().map(|(_, write)| write.as_raw_fd()),
                unused: next_pipe.as_ref().map(|(read, _)| read.as_raw_fd()),
            };

            // SAFETY: the child only rewires descriptors, then execs or exits.
            match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    child::run_stage(stage, fds, &program, &self.builtins, state)
                }
                Ok(ForkResult::Parent { child }) => {
                    log::debug!("fork: pid {} for {:?}", child, stage.command.args);
                    if pipeline.background {
                        reaper::track(child);
                    }
                    pids.push(child);
                }
                Err(e) => {
                    drop(next_pipe);
                    drop(prev_read.take());
                    self.abandon(&pids, pipeline.background);
                    return Err(ExecError::Fork(e));
                }
            }

            // The write end belongs to the child now; keep only the read end
            // for the next stage. The previous read end is closed here.
            prev_read = next_pipe.map(|(read, _write)| read);
        }

        if pipeline.background {
            if let Some(last) = pids.last() {
                println!("[{}]", last);
                let _ = io::stdout().flush();
            }
            return Ok(0);
        }

        // Every stage is waited for; only the last one's status counts
        let mut status = Ok(0);
        for (i, &pid) in pids.iter().enumerate() {
            let result = wait_for(pid);
            if i + 1 == pids.len() {
                status = result;
            } else if let Err(e) = result {
                log::warn!("wait for pid {}: {}", pid, e);
            }
        }
        status
    }

    // Stages launched before a setup failure still have to be reaped.
    fn abandon(&self, pids: &[Pid], background: bool) {
        if background {
            // already handed to the collector
            return;
        }
        for &pid in pids {
            if let Err(e) = wait_for(pid) {
                log::warn!("wait for pid {}: {}", pid, e);
            }
        }
    }
}

fn wait_for(pid: Pid) -> ExecStatus {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                log::debug!("pid {} exited with {}", pid, code);
                return Ok(code);
            }
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                log::debug!("pid {} killed by {}", pid, sig);
                return Ok(STATUS_SIGNAL_BASE + sig as i32);
            }
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::Wait(e)),
        }
    }
}
