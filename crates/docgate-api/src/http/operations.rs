//! Conversion endpoint handlers.
//!
//! Each handler is one line of configuration over the shared pipeline; the
//! per-operation differences (allowed extensions, parameters, packaging)
//! live in the operation descriptor and the dispatcher.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::Response;
use docgate_transform::OperationKind;

use crate::http::errors::ApiError;
use crate::http::pipeline;
use crate::state::ApiState;

macro_rules! operation_handler {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        pub(crate) async fn $name(
            State(state): State<Arc<ApiState>>,
            multipart: Multipart,
        ) -> Result<Response, ApiError> {
            pipeline::run(&state, $kind, multipart).await
        }
    };
}

operation_handler!(
    /// `POST /compress/compress-pdf`
    compress_pdf,
    OperationKind::Compress
);
operation_handler!(
    /// `POST /split/split-pdf`
    split_pdf,
    OperationKind::Split
);
operation_handler!(
    /// `POST /merge/merge-pdf`
    merge_pdf,
    OperationKind::Merge
);
operation_handler!(
    /// `POST /convert/edit-pdf`
    edit_pdf,
    OperationKind::Edit
);
operation_handler!(
    /// `POST /protect/protect-pdf`
    protect_pdf,
    OperationKind::Protect
);
operation_handler!(
    /// `POST /convert/pdf-to-jpg`
    pdf_to_jpg,
    OperationKind::PdfToJpg
);
operation_handler!(
    /// `POST /convert/pdf-to-word`
    pdf_to_word,
    OperationKind::PdfToWord
);
operation_handler!(
    /// `POST /convert/pdf-to-excel`
    pdf_to_excel,
    OperationKind::PdfToExcel
);
operation_handler!(
    /// `POST /convert/pdf-to-pptx`
    pdf_to_pptx,
    OperationKind::PdfToPptx
);
operation_handler!(
    /// `POST /convert/word-to-pdf`
    word_to_pdf,
    OperationKind::WordToPdf
);
operation_handler!(
    /// `POST /convert/excel-to-pdf`
    excel_to_pdf,
    OperationKind::ExcelToPdf
);
operation_handler!(
    /// `POST /convert/pptx-to-pdf`
    pptx_to_pdf,
    OperationKind::PptxToPdf
);
