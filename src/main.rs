use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lockstep::align;
use lockstep::config::ServiceConfig;
use lockstep::error::CoreError;
use lockstep::kernel::event::{Command, Completion, Event, UploadFile};
use lockstep::kernel::reactor::{NoticeLevel, ReactorConfig, SideEffect};
use lockstep::kernel::recorder::{CaptureSession, RecorderPhase};
use lockstep::kernel::time::TICK_MS;
use lockstep::services::jobs::JobsClient;
use lockstep::services::storage::StorageClient;
use lockstep::services::transcribe::TranscribeClient;
use lockstep::services::tts::{TtsClient, Voice};
use lockstep::Reactor;

/// Handle to the capture thread. The thread owns the cpal stream; flipping
/// `stop` makes it drop the stream, which releases the device.
struct MicThread {
    stop: Arc<AtomicBool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServiceConfig::from_env();
    tracing::info!("lockstep console, backend at {}", config.base_url);

    let tts = TtsClient::new(&config);
    let storage = StorageClient::new(&config);
    let transcribe = TranscribeClient::new(&config);
    let jobs = JobsClient::new(&config);

    let (tx, rx) = mpsc::channel::<Event>(256);
    let mut reactor = Reactor::new(rx, ReactorConfig::default());

    let shutdown = CancellationToken::new();
    spawn_console(tx.clone(), jobs, shutdown.clone());

    let mut mic: Option<(CaptureSession, MicThread)> = None;
    let mut last_elapsed_printed = u64::MAX;

    let mut cadence = tokio::time::interval(Duration::from_millis(TICK_MS));
    cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cadence.tick().await;

        let mut events = Vec::new();
        while let Ok(event) = reactor.receiver.try_recv() {
            events.push(event);
        }

        let effects = reactor.tick_step(events);

        for effect in effects {
            match effect {
                SideEffect::Notify(notice) => {
                    let tag = match notice.level {
                        NoticeLevel::Info => "info",
                        NoticeLevel::Success => "ok",
                        NoticeLevel::Error => "error",
                    };
                    println!("[{}] {}", tag, notice.message);
                }

                SideEffect::CallGenerate { text, voice } => {
                    let tts = tts.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let result = tts
                            .generate(&text, voice)
                            .await
                            .map_err(CoreError::Synthesis);
                        let _ = tx
                            .send(Event::Completion(Completion::Generated { result }))
                            .await;
                    });
                }

                SideEffect::PersistBase64 {
                    audio_base64,
                    mime_type,
                    folder,
                    filename,
                    provenance,
                } => {
                    let storage = storage.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let result = storage
                            .save(&audio_base64, &folder, &filename)
                            .await
                            .map_err(CoreError::Persistence);
                        let _ = tx
                            .send(Event::Completion(Completion::Persisted {
                                provenance,
                                mime_type,
                                result,
                            }))
                            .await;
                    });
                }

                SideEffect::PersistBlob {
                    bytes,
                    mime_type,
                    folder,
                    filename,
                    provenance,
                } => {
                    let storage = storage.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let result = storage
                            .upload(bytes, &mime_type, &folder, &filename)
                            .await
                            .map_err(CoreError::Persistence);
                        let _ = tx
                            .send(Event::Completion(Completion::Persisted {
                                provenance,
                                mime_type,
                                result,
                            }))
                            .await;
                    });
                }

                SideEffect::AcquireMic { session } => {
                    // Replace any straggler; its stop flag ends the old thread.
                    if let Some((_, old)) = mic.take() {
                        old.stop.store(true, Ordering::Relaxed);
                    }
                    mic = Some((session, spawn_mic_thread(tx.clone(), session)));
                }

                SideEffect::ReleaseMic { session } => {
                    // Only the named session is released; a release aimed at an
                    // already-replaced stream must not kill the live one.
                    if let Some((id, handle)) = mic.take() {
                        if id == session {
                            handle.stop.store(true, Ordering::Relaxed);
                        } else {
                            mic = Some((id, handle));
                        }
                    }
                }

                SideEffect::CallAlign {
                    epoch,
                    audio_url,
                    text,
                    settle_ms,
                } => {
                    let transcribe = transcribe.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if settle_ms > 0 {
                            tokio::time::sleep(Duration::from_millis(settle_ms)).await;
                        }
                        let lines = align::expected_lines(&text);
                        let result = transcribe
                            .align(&audio_url, &text)
                            .await
                            .map(|resp| align::apply(&lines, resp))
                            .map_err(CoreError::Alignment);
                        let _ = tx
                            .send(Event::Completion(Completion::Aligned { epoch, result }))
                            .await;
                    });
                }
            }
        }

        // One-second elapsed readout while recording.
        if reactor.recorder.phase() == RecorderPhase::Recording {
            let elapsed = reactor.recorder.elapsed_seconds();
            if elapsed != last_elapsed_printed {
                println!("[rec] {}s", elapsed);
                last_elapsed_printed = elapsed;
            }
        } else {
            last_elapsed_printed = u64::MAX;
        }
    }
}

/// Capture thread: owns the cpal stream for exactly one session and pumps
/// chunks into the kernel channel until told to stop. Dropping the capture at
/// the end of the scope is the single release per acquisition.
fn spawn_mic_thread(tx: mpsc::Sender<Event>, session: CaptureSession) -> MicThread {
    use ringbuf::traits::{Consumer, Observer, Split};
    use ringbuf::HeapRb;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    std::thread::spawn(move || {
        let rb = HeapRb::<f32>::new(48000);
        let (producer, mut consumer) = rb.split();

        let capture = match lockstep::audio::capture::MicCapture::new(producer) {
            Ok(capture) => capture,
            Err(err) => {
                let _ = tx.blocking_send(Event::Completion(Completion::CaptureFailed {
                    session,
                    message: err.to_string(),
                }));
                return;
            }
        };

        let _ = tx.blocking_send(Event::Completion(Completion::CaptureReady {
            session,
            sample_rate: capture.sample_rate,
        }));

        let mut buf = vec![0.0f32; 4096];
        while !stop_flag.load(Ordering::Relaxed) {
            if consumer.occupied_len() == 0 {
                std::thread::sleep(Duration::from_millis(10));
                continue;
            }
            let n = consumer.pop_slice(&mut buf);
            if n > 0 {
                let _ = tx.blocking_send(Event::Completion(Completion::CaptureChunk {
                    session,
                    samples: buf[..n].to_vec(),
                }));
            }
        }
        // capture drops here; stream stops, device released.
    });

    MicThread { stop }
}

fn spawn_console(tx: mpsc::Sender<Event>, jobs: JobsClient, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        println!("commands: text <s> | gen [voice] | save | discard | upload <path> | rec | stop | align | seg <i> <start> <end> | clear | ingest <url>");

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (word, rest) = line.split_once(' ').unwrap_or((line, ""));

            let command = match word {
                "text" => Some(Command::EditText(rest.replace("\\n", "\n"))),
                "gen" => {
                    let voice = rest.trim().parse::<Voice>().unwrap_or_default();
                    Some(Command::Generate { voice })
                }
                "save" => Some(Command::SavePreview),
                "discard" => Some(Command::DiscardPreview),
                "upload" => match read_upload(rest.trim()).await {
                    Ok(file) => Some(Command::Upload(file)),
                    Err(err) => {
                        println!("[error] {}", err);
                        None
                    }
                },
                "rec" => Some(Command::StartRecording),
                "stop" => Some(Command::StopRecording),
                "align" => Some(Command::Align),
                "clear" => Some(Command::ClearAudio),
                "seg" => parse_segment_edit(rest),
                "ingest" => {
                    spawn_ingest(jobs.clone(), rest.trim().to_string(), shutdown.child_token());
                    None
                }
                other => {
                    println!("[error] unknown command: {}", other);
                    None
                }
            };

            if let Some(command) = command {
                if tx.send(Event::Command(command)).await.is_err() {
                    break;
                }
            }
        }
    });
}

async fn read_upload(path: &str) -> anyhow::Result<UploadFile> {
    let bytes = tokio::fs::read(path).await?;
    let name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.mp3".to_string());
    let mime_type = if name.to_ascii_lowercase().ends_with(".mp3") {
        "audio/mpeg".to_string()
    } else {
        "application/octet-stream".to_string()
    };
    Ok(UploadFile {
        name,
        mime_type,
        bytes,
    })
}

fn parse_segment_edit(rest: &str) -> Option<Command> {
    let mut parts = rest.split_whitespace();
    let index = parts.next()?.parse().ok()?;
    let start = parts.next()?.parse().ok()?;
    let end = parts.next()?.parse().ok()?;
    Some(Command::EditSegment { index, start, end })
}

fn spawn_ingest(jobs: JobsClient, url: String, cancel: CancellationToken) {
    tokio::spawn(async move {
        if url.is_empty() {
            println!("[error] ingest needs a source url");
            return;
        }
        let job = match jobs.create(&url).await {
            Ok(job) => job,
            Err(err) => {
                println!("[error] failed to create ingestion job: {}", err);
                return;
            }
        };
        println!("[info] ingestion job {} queued", job.id);
        match jobs.wait(&job.id, &cancel).await {
            Ok(done) if done.status == lockstep::services::jobs::JobStatus::Failed => {
                println!(
                    "[error] ingestion failed: {}",
                    done.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
            Ok(done) => println!("[ok] ingestion job {} completed", done.id),
            Err(err) => println!("[error] ingestion polling failed: {}", err),
        }
    });
}
