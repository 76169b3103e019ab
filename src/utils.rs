pub mod json_responder;
