//! # binoculars-core
//!
//! Binoculars 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 에이전트와 콜렉터가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 메트릭, 배치, 서버 응답, 저장용 포인트 (serde Serialize/Deserialize)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 콜렉터/에이전트 설정 구조체
//! - [`period`] — 단위 접미사 duration 문법의 주기 문자열 파싱

pub mod config;
pub mod error;
pub mod models;
pub mod period;
pub mod ports;
