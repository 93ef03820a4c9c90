use crate::{Error, MediaEngine, PlaybackController, Prompt, View};
use log::{info, warn};
use std::fs::{self, FileTimes};
use std::io;
use std::path::{Path, PathBuf};

impl<E: MediaEngine, V: View> PlaybackController<E, V> {
    /// Copies the open file to the remembered destination, asking for one first
    /// if there is none yet.
    ///
    /// Returns where the copy went, or `None` if the user cancelled.
    pub fn save_copy(&mut self, prompt: &mut impl Prompt) -> Result<Option<PathBuf>, Error> {
        let source = self.local_source()?.to_path_buf();

        if let Some(target) = self.save_target.clone() {
            self.save_copy_as(&target)?;
            return Ok(Some(target));
        }

        let suggested = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_owned());
        match prompt.save_destination(&suggested) {
            Some(destination) => {
                self.save_copy_as(&destination)?;
                Ok(Some(destination))
            }
            None => {
                self.view.show_status("Save cancelled");
                Ok(None)
            }
        }
    }

    /// Copies the open file to `destination` and remembers it for later saves.
    pub fn save_copy_as(&mut self, destination: &Path) -> Result<(), Error> {
        let source = self.local_source()?.to_path_buf();
        copy_preserving(&source, destination)?;

        info!("saved {} to {}", source.display(), destination.display());
        self.save_target = Some(destination.to_path_buf());
        self.view.show_status(&format!("Saved to: {}", destination.display()));
        Ok(())
    }

    /// Deletes the open file after the user confirms.
    ///
    /// Playback is stopped before the file is touched so the engine lets go of
    /// it. Returns `false` if the user declined.
    pub fn delete_current_file(&mut self, prompt: &mut impl Prompt) -> Result<bool, Error> {
        let path = self.local_source()?.to_path_buf();
        if !path.exists() {
            return Err(Error::NoLocalSource);
        }
        if !prompt.confirm_delete(&path) {
            self.view.show_status("Delete cancelled");
            return Ok(false);
        }

        self.engine.stop()?;
        self.mark_stopped();
        fs::remove_file(&path)?;

        info!("deleted {}", path.display());
        self.engine.unload();
        self.session = None;
        self.save_target = None;
        self.seeking = false;
        self.reset_view();
        self.view.show_status("File deleted");
        Ok(true)
    }

    fn local_source(&self) -> Result<&Path, Error> {
        self.session
            .as_ref()
            .and_then(|session| session.source().local_path())
            .ok_or(Error::NoLocalSource)
    }
}

/// Copies contents and permissions, then carries over access and modification
/// times where the platform allows it.
fn copy_preserving(source: &Path, destination: &Path) -> io::Result<()> {
    if destination.canonicalize().is_ok_and(|dest| dest == source) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is the file being played", destination.display()),
        ));
    }

    fs::copy(source, destination)?;
    if let Err(err) = copy_times(source, destination) {
        warn!(
            "could not preserve timestamps on {}: {err}",
            destination.display()
        );
    }
    Ok(())
}

fn copy_times(source: &Path, destination: &Path) -> io::Result<()> {
    let metadata = fs::metadata(source)?;
    let times = FileTimes::new()
        .set_accessed(metadata.accessed()?)
        .set_modified(metadata.modified()?);
    fs::OpenOptions::new()
        .write(true)
        .open(destination)?
        .set_times(times)
}
