//! Export entry points: synchronous call and background worker thread.

use std::path::Path;
use std::sync::mpsc;
use std::thread;

use crate::assemble::{assemble_sheet_model, validate_sheet_config};
use crate::spec::{
    EnumSheetExportReply, SheetExportError, SpecSheetExportRequest, SpecSheetModel,
    SpecXlsxWriteOptions,
};
use crate::writer::{save_sheet_model, save_sheet_model_to_buffer};

const C_WORKER_THREAD_NAME: &str = "axiomkit-sheet-export";

/// Run one export request to XLSX bytes on the calling thread.
pub fn export_sheet_to_buffer(
    request: &SpecSheetExportRequest,
    options: &SpecXlsxWriteOptions,
) -> Result<Vec<u8>, SheetExportError> {
    let model = derive_sheet_model(request)?;
    save_sheet_model_to_buffer(&model, &request.sheet_name, options)
}

/// Run one export request and save the workbook at `path_file_out`.
pub fn export_sheet_to_file(
    request: &SpecSheetExportRequest,
    path_file_out: &Path,
    options: &SpecXlsxWriteOptions,
) -> Result<(), SheetExportError> {
    let model = derive_sheet_model(request)?;
    save_sheet_model(&model, path_file_out, &request.sheet_name, options)
}

fn derive_sheet_model(request: &SpecSheetExportRequest) -> Result<SpecSheetModel, SheetExportError> {
    if request.records.is_empty() {
        return Err(SheetExportError::EmptyRecords);
    }
    validate_sheet_config(&request.config).map_err(SheetExportError::InvalidConfig)?;

    Ok(assemble_sheet_model(
        &request.records,
        &request.columns,
        &request.config,
        request.group_field.as_deref(),
    ))
}

fn derive_export_reply(
    request: &SpecSheetExportRequest,
    options: &SpecXlsxWriteOptions,
) -> EnumSheetExportReply {
    match export_sheet_to_buffer(request, options) {
        Ok(v_bytes) => EnumSheetExportReply::Artifact(v_bytes),
        Err(SheetExportError::EmptyRecords) => EnumSheetExportReply::Empty,
        Err(err) => EnumSheetExportReply::Failed(err.to_string()),
    }
}

/// Background export worker.
///
/// Each posted request gets exactly one reply, in posting order. The worker
/// keeps no state between requests. Dropping it closes the request channel
/// and joins the thread.
pub struct SheetExportWorker {
    tx_request: Option<mpsc::Sender<SpecSheetExportRequest>>,
    rx_reply: mpsc::Receiver<EnumSheetExportReply>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SheetExportWorker {
    /// Start the worker thread; `options` apply to every request.
    pub fn spawn(options: SpecXlsxWriteOptions) -> Result<Self, SheetExportError> {
        let (tx_request, rx_request) = mpsc::channel::<SpecSheetExportRequest>();
        let (tx_reply, rx_reply) = mpsc::channel::<EnumSheetExportReply>();

        let handle = thread::Builder::new()
            .name(C_WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                log::info!("Sheet export worker started.");
                for request in rx_request {
                    let reply = derive_export_reply(&request, &options);
                    if let EnumSheetExportReply::Failed(msg) = &reply {
                        log::warn!("Sheet export failed: {msg}");
                    }
                    if tx_reply.send(reply).is_err() {
                        break;
                    }
                }
                log::info!("Sheet export worker stopped.");
            })
            .map_err(|err| SheetExportError::WorkerUnavailable(err.to_string()))?;

        Ok(Self {
            tx_request: Some(tx_request),
            rx_reply,
            handle: Some(handle),
        })
    }

    /// Send one request to the worker.
    pub fn post(&self, request: SpecSheetExportRequest) -> Result<(), SheetExportError> {
        let tx_request = self
            .tx_request
            .as_ref()
            .ok_or_else(|| SheetExportError::WorkerUnavailable("worker closed".to_string()))?;
        tx_request
            .send(request)
            .map_err(|_| SheetExportError::WorkerUnavailable("worker has gone away".to_string()))
    }

    /// Wait for the next reply.
    pub fn recv(&self) -> Result<EnumSheetExportReply, SheetExportError> {
        self.rx_reply
            .recv()
            .map_err(|_| SheetExportError::WorkerUnavailable("worker has gone away".to_string()))
    }

    /// Post one request and wait for its reply.
    ///
    /// Empty record sets never reach the worker.
    pub fn export(
        &self,
        request: SpecSheetExportRequest,
    ) -> Result<EnumSheetExportReply, SheetExportError> {
        if request.records.is_empty() {
            log::info!("No records to export; skipping.");
            return Ok(EnumSheetExportReply::Empty);
        }
        self.post(request)?;
        self.recv()
    }
}

impl Drop for SheetExportWorker {
    fn drop(&mut self) {
        self.tx_request.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
