//! Background cover decoding. Requests go to a worker thread; finished
//! decodes are drained on the UI thread, in whatever order they completed.

use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
};

use anyhow::{Context, Result};
use shelf_core::{CoverLoadError, TextureRequest, TextureTicket};

use crate::texture::{DecodedCover, decode_cover};

struct CoverJob {
    ticket: TextureTicket,
    path: PathBuf,
    attempt: u32,
}

pub struct CoverResult {
    pub ticket: TextureTicket,
    pub attempt: u32,
    pub result: std::result::Result<DecodedCover, CoverLoadError>,
}

pub struct CoverLoader {
    jobs: Sender<CoverJob>,
    results: Receiver<CoverResult>,
    in_flight: usize,
}

impl CoverLoader {
    pub fn spawn() -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<CoverJob>();
        let (result_tx, result_rx) = mpsc::channel();
        thread::Builder::new()
            .name("shelf_cover_decode".to_string())
            .spawn(move || decode_loop(job_rx, result_tx))
            .context("spawning cover decode thread")?;
        Ok(Self {
            jobs: job_tx,
            results: result_rx,
            in_flight: 0,
        })
    }

    pub fn request(&mut self, request: TextureRequest) -> Result<()> {
        self.jobs
            .send(CoverJob {
                ticket: request.ticket,
                path: PathBuf::from(request.cover),
                attempt: request.attempt,
            })
            .context("cover decode thread stopped")?;
        self.in_flight += 1;
        Ok(())
    }

    /// Everything that finished since the last call.
    pub fn drain(&mut self) -> Vec<CoverResult> {
        let mut finished = Vec::new();
        loop {
            match self.results.try_recv() {
                Ok(result) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    finished.push(result);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("cover decode thread exited; {} jobs lost", self.in_flight);
                    self.in_flight = 0;
                    break;
                }
            }
        }
        finished
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

fn decode_loop(jobs: Receiver<CoverJob>, results: Sender<CoverResult>) {
    while let Ok(job) = jobs.recv() {
        log::debug!(
            "decoding {} (attempt {})",
            job.path.display(),
            job.attempt
        );
        let result = decode_cover(&job.path);
        let finished = CoverResult {
            ticket: job.ticket,
            attempt: job.attempt,
            result,
        };
        if results.send(finished).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn wait_for(loader: &mut CoverLoader, count: usize) -> Vec<CoverResult> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut results = Vec::new();
        while results.len() < count && Instant::now() < deadline {
            results.extend(loader.drain());
            thread::sleep(Duration::from_millis(5));
        }
        results
    }

    #[test]
    fn decodes_and_reports_failures() {
        let temp = tempdir().expect("temp dir");
        let good = temp.path().join("good.png");
        let image: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        image.save(&good).expect("write png");

        let mut loader = CoverLoader::spawn().expect("spawn loader");
        let good_ticket = TextureTicket {
            slot: 0,
            generation: 1,
        };
        let bad_ticket = TextureTicket {
            slot: 1,
            generation: 2,
        };
        loader
            .request(TextureRequest {
                ticket: good_ticket,
                cover: good.to_string_lossy().into_owned(),
                attempt: 1,
            })
            .expect("queue good");
        loader
            .request(TextureRequest {
                ticket: bad_ticket,
                cover: temp.path().join("absent.png").to_string_lossy().into_owned(),
                attempt: 2,
            })
            .expect("queue bad");

        let results = wait_for(&mut loader, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(loader.in_flight(), 0);
        for result in results {
            if result.ticket == good_ticket {
                let cover = result.result.expect("decoded");
                assert_eq!(cover.data[..4], [1, 2, 3, 255]);
            } else {
                assert_eq!(result.ticket, bad_ticket);
                assert_eq!(result.attempt, 2);
                assert!(matches!(result.result, Err(CoverLoadError::Missing(_))));
            }
        }
    }
}
