//! バックグラウンドワーカー
//!
//! 専用スレッドでOCRとExcel保存を行い、結果はチャネル経由のイベントでのみ通知する。
//! UI側は `try_recv` でポーリングし、ワーカーを待ってブロックしない。
//! 開始後のキャンセルはできない。

use crate::analyzer::{process_images, OcrBackend, Progress};
use crate::error::{OcrError, Result};
use crate::export::{export_results, ExportOutcome};
use crate::scanner::ImageRef;
use gemini_ocr_common::OcrRecord;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvError, Sender, TryRecvError};
use std::thread::JoinHandle;

/// 1回分の処理内容
#[derive(Debug, Clone)]
pub struct OcrJob {
    pub images: Vec<ImageRef>,
    pub custom_prompt: String,
    pub output_path: PathBuf,
    pub fallback_path: PathBuf,
}

/// ワーカーからの通知
///
/// 正常時: `Progress` ×枚数 → `Results` → `Complete`。
/// 想定外の失敗時は `Error` で終了する。
#[derive(Debug)]
pub enum WorkerEvent {
    Progress(Progress),
    Results(Vec<OcrRecord>),
    Error(String),
    Complete(ExportOutcome),
}

impl WorkerEvent {
    /// これ以降イベントが来ないか
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerEvent::Error(_) | WorkerEvent::Complete(_))
    }
}

pub struct WorkerHandle {
    receiver: Receiver<WorkerEvent>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// 届いているイベントを1件取得（ブロックしない）
    pub fn try_recv(&self) -> std::result::Result<WorkerEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    /// 次のイベントを待つ
    pub fn recv(&self) -> std::result::Result<WorkerEvent, RecvError> {
        self.receiver.recv()
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

pub fn spawn_worker<B>(job: OcrJob, backend: B) -> Result<WorkerHandle>
where
    B: OcrBackend + 'static,
{
    let (tx, rx) = mpsc::channel();

    let thread = std::thread::Builder::new()
        .name("ocr-worker".to_string())
        .spawn(move || run_job(job, backend, tx))
        .map_err(|e| OcrError::Worker(format!("スレッド起動エラー: {}", e)))?;

    Ok(WorkerHandle {
        receiver: rx,
        thread,
    })
}

fn run_job<B: OcrBackend>(job: OcrJob, backend: B, tx: Sender<WorkerEvent>) {
    // 受信側が閉じていても処理自体は最後まで行う
    let send = |event: WorkerEvent| {
        let _ = tx.send(event);
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            send(WorkerEvent::Error(format!("ランタイム初期化エラー: {}", e)));
            return;
        }
    };

    tracing::info!(images = job.images.len(), "OCR処理を開始します");
    let records = runtime.block_on(process_images(
        &backend,
        &job.images,
        &job.custom_prompt,
        |progress| send(WorkerEvent::Progress(progress)),
    ));

    match export_results(&records, &job.output_path, &job.fallback_path) {
        Ok(outcome) => {
            send(WorkerEvent::Results(records));
            send(WorkerEvent::Complete(outcome));
        }
        Err(e) => {
            tracing::error!(error = %e, "結果を保存できませんでした");
            send(WorkerEvent::Error(format!("結果を保存できませんでした: {}", e)));
        }
    }
}
