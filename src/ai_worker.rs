use crate::ai::{
    ContentGenerator, PdfTextExtractor, generate_flashcards_from_pdf, generate_questions_from_pdf,
};
use crate::logger;
use crate::models::{Flashcard, Question};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Questions {
        course_id: String,
        pdf_path: PathBuf,
        count: usize,
    },
    Flashcards {
        course_id: String,
        pdf_path: PathBuf,
        count: usize,
    },
}

#[derive(Debug)]
pub enum GenerationResponse {
    Questions {
        course_id: String,
        questions: Vec<Question>,
    },
    Flashcards {
        course_id: String,
        cards: Vec<Flashcard>,
    },
    Error {
        course_id: String,
        error: String,
    },
}

/// Runs generation requests one at a time on a dedicated thread until the
/// request channel closes.
pub fn spawn_generation_worker(
    extractor: Arc<dyn PdfTextExtractor>,
    generator: Arc<dyn ContentGenerator>,
    tx: Sender<GenerationResponse>,
    rx: Receiver<GenerationRequest>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("study-deck::generation_worker".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    logger::log(&format!("Generation worker could not start runtime: {}", e));
                    return;
                }
            };

            while let Ok(request) = rx.recv() {
                let response = rt.block_on(handle_request(
                    extractor.as_ref(),
                    generator.as_ref(),
                    request,
                ));
                if tx.send(response).is_err() {
                    break;
                }
            }

            logger::log("Generation worker channel disconnected, exiting");
        })
}

async fn handle_request(
    extractor: &dyn PdfTextExtractor,
    generator: &dyn ContentGenerator,
    request: GenerationRequest,
) -> GenerationResponse {
    match request {
        GenerationRequest::Questions {
            course_id,
            pdf_path,
            count,
        } => {
            logger::log(&format!("Worker generating {} questions for {}", count, course_id));
            match generate_questions_from_pdf(extractor, generator, &pdf_path, count).await {
                Ok(questions) => GenerationResponse::Questions {
                    course_id,
                    questions,
                },
                Err(e) => GenerationResponse::Error {
                    course_id,
                    error: e.to_string(),
                },
            }
        }
        GenerationRequest::Flashcards {
            course_id,
            pdf_path,
            count,
        } => {
            logger::log(&format!("Worker generating {} flashcards for {}", count, course_id));
            match generate_flashcards_from_pdf(extractor, generator, &pdf_path, count).await {
                Ok(cards) => GenerationResponse::Flashcards { course_id, cards },
                Err(e) => GenerationResponse::Error {
                    course_id,
                    error: e.to_string(),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::generator::mock::{FixedExtractor, MockGenerator};
    use std::sync::mpsc;
    use std::time::Duration;

    fn worker(
        reply: Result<String, String>,
    ) -> (
        Sender<GenerationRequest>,
        Receiver<GenerationResponse>,
        thread::JoinHandle<()>,
    ) {
        let (req_tx, req_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_generation_worker(
            Arc::new(FixedExtractor("Some lecture notes".to_string())),
            Arc::new(MockGenerator { reply }),
            resp_tx,
            req_rx,
        )
        .unwrap();
        (req_tx, resp_rx, handle)
    }

    #[test]
    fn test_worker_generates_flashcards() {
        let (tx, rx, handle) = worker(Ok(
            r#"[{"id": 0, "front": "Term", "back": "Meaning", "explanation": null}]"#.to_string(),
        ));

        tx.send(GenerationRequest::Flashcards {
            course_id: "c1".to_string(),
            pdf_path: PathBuf::from("notes.pdf"),
            count: 1,
        })
        .unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            GenerationResponse::Flashcards { course_id, cards } => {
                assert_eq!(course_id, "c1");
                assert_eq!(cards[0].front, "Term");
            }
            other => panic!("unexpected response: {:?}", other),
        }

        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_worker_reports_errors() {
        let (tx, rx, handle) = worker(Err("quota exceeded".to_string()));

        tx.send(GenerationRequest::Questions {
            course_id: "c2".to_string(),
            pdf_path: PathBuf::from("notes.pdf"),
            count: 4,
        })
        .unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            GenerationResponse::Error { course_id, error } => {
                assert_eq!(course_id, "c2");
                assert_eq!(error, "quota exceeded");
            }
            other => panic!("unexpected response: {:?}", other),
        }

        drop(tx);
        handle.join().unwrap();
    }
}
